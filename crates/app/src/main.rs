//! # modsim
//!
//! CLI for running modulation-selection simulations over channel traces.

mod config;
mod error;
mod sweep;
mod trace_gen;

use clap::Parser;
use config::{print_config, seed_or_time, Cli, Commands, GenTraceArgs, RunArgs, SweepArgs};
use error::AppError;
use modsim_core::metrics::RunMetrics;
use modsim_core::run_simulation;
use sweep::{run_sweep, SweepParams, SweepPlan};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<(), AppError> {
    // RUST_LOG overrides the default "warn" level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Sweep(args) => sweep(args),
        Commands::GenTrace(args) => gen_trace(args),
    }
}

fn run(args: RunArgs) -> Result<(), AppError> {
    let config = args.to_config(seed_or_time(args.seed));
    if args.print_config {
        print_config(&config);
    }

    // each run starts a fresh log
    if let Some(log_path) = &config.log_path {
        if log_path.exists() {
            std::fs::remove_file(log_path)?;
        }
    }

    let report = run_simulation(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.summary {
        report.print_summary();
    } else {
        print!("{}", RunMetrics::to_line(report.metrics.as_ref()));
    }
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<(), AppError> {
    let params = SweepParams::load(&args.params_path)?;
    let plan = SweepPlan::resolve(params, &args)?;

    // printed so a time-seeded sweep can be repeated
    eprintln!("sweep seed: {}", plan.seed);

    let summary = run_sweep(&plan)?;
    println!("{}", summary.out_path.display());

    if summary.failed > 0 {
        return Err(AppError::SweepFailed {
            failed: summary.failed,
            runs: summary.runs,
        });
    }
    Ok(())
}

fn gen_trace(args: GenTraceArgs) -> Result<(), AppError> {
    let seed = seed_or_time(args.seed);
    trace_gen::write_trace_file(&args.out, seed, args.records)?;
    eprintln!("wrote {} records to {} (seed {seed})", args.records, args.out.display());
    Ok(())
}
