//! Command-line configuration for modsim.
//!
//! Parses arguments into a [`SimulationConfig`] per run. Strategy
//! hyperparameters are optional flags layered over each strategy's
//! defaults, so `modsim run --strategy BE` works without further arguments.
//!
//! # Seeds
//!
//! Without `--seed`, a time-based seed is chosen and printed so the run can
//! be reproduced.

use clap::{Args, Parser, Subcommand};
use modsim_core::simulation::{DEFAULT_AVG_RETRY, DEFAULT_MAX_RETRY};
use modsim_core::strategy::{
    BoltzmannParams, DiscountedUcbParams, EpsilonGreedyParams, ThreeMParams,
};
use modsim_core::{SimulationConfig, StrategyConfig, StrategyKind};
use std::path::PathBuf;

/// modsim - trace-driven modulation selection simulator
#[derive(Parser, Debug)]
#[command(name = "modsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay one trace with one strategy
    Run(RunArgs),
    /// Run every sensor x strategy x replication listed in a parameters file
    Sweep(SweepArgs),
    /// Write a synthetic channel trace
    GenTrace(GenTraceArgs),
}

/// Configuration for a single run
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Trace file to replay
    #[arg(long)]
    pub in_path: PathBuf,

    /// Metrics file to append `PDR<TAB>RNP` to
    #[arg(long)]
    pub out_path: Option<PathBuf>,

    /// Per-packet log file (replaced if it exists)
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Strategy: EG, BE, D-UCB, 3M, rand or best
    #[arg(short, long)]
    pub strategy: StrategyKind,

    /// Random seed for determinism (default: time-based)
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub retry: RetryArgs,

    #[command(flatten)]
    pub params: StrategyArgs,

    /// Print resolved configuration
    #[arg(long)]
    pub print_config: bool,

    /// Print a run summary instead of the bare metrics line
    #[arg(long)]
    pub summary: bool,

    /// Print the run report as JSON
    #[arg(long, conflicts_with = "summary")]
    pub json: bool,
}

/// Retry budget settings
#[derive(Args, Debug, Clone, Copy)]
pub struct RetryArgs {
    /// Average number of attempts per packet
    #[arg(long, default_value_t = DEFAULT_AVG_RETRY)]
    pub avg_retry: u32,

    /// Maximum number of extra attempts a packet may borrow
    #[arg(long, default_value_t = DEFAULT_MAX_RETRY)]
    pub max_retry: u32,

    /// Never give a packet fewer attempts than this (default: no floor)
    #[arg(long)]
    pub min_budget: Option<i64>,
}

/// Strategy hyperparameters; unset values keep the strategy default
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct StrategyArgs {
    /// Exploration probability (EG)
    #[arg(long)]
    pub eps: Option<f64>,

    /// Learning rate (EG, BE)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Temperature (BE)
    #[arg(long)]
    pub tau: Option<f64>,

    /// Outcome window length (3M)
    #[arg(long)]
    pub window: Option<usize>,

    /// Discount factor (D-UCB)
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Exploration coefficient (D-UCB)
    #[arg(long)]
    pub xi: Option<f64>,

    /// Reward bound (D-UCB, unused by the selection rule)
    #[arg(long = "B", id = "reward_bound")]
    pub b: Option<f64>,

    /// Preference exponent (3M)
    #[arg(long)]
    pub w: Option<f64>,
}

impl StrategyArgs {
    /// Defaults of `kind` with any flags given on the command line applied.
    pub fn resolve(&self, kind: StrategyKind) -> StrategyConfig {
        match kind.default_config() {
            StrategyConfig::EpsilonGreedy(p) => StrategyConfig::EpsilonGreedy(EpsilonGreedyParams {
                eps: self.eps.unwrap_or(p.eps),
                alpha: self.alpha.unwrap_or(p.alpha),
            }),
            StrategyConfig::Boltzmann(p) => StrategyConfig::Boltzmann(BoltzmannParams {
                tau: self.tau.unwrap_or(p.tau),
                alpha: self.alpha.unwrap_or(p.alpha),
            }),
            StrategyConfig::DiscountedUcb(p) => StrategyConfig::DiscountedUcb(DiscountedUcbParams {
                gamma: self.gamma.unwrap_or(p.gamma),
                xi: self.xi.unwrap_or(p.xi),
                b: self.b.unwrap_or(p.b),
            }),
            StrategyConfig::ThreeM(p) => StrategyConfig::ThreeM(ThreeMParams {
                w: self.w.unwrap_or(p.w),
                tau: self.window.unwrap_or(p.tau),
            }),
            other => other,
        }
    }
}

/// Configuration for a sweep
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Sweep parameters file
    #[arg(long, default_value = "parameters.json")]
    pub params_path: PathBuf,

    /// Average number of attempts per packet (overrides the file)
    #[arg(long)]
    pub n_avg: Option<u32>,

    /// Maximum number of extra attempts (overrides the file)
    #[arg(long)]
    pub n_max: Option<u32>,

    /// Replications per sensor and strategy (overrides the file)
    #[arg(long)]
    pub replications: Option<u32>,

    /// Output file prefix (overrides the file)
    #[arg(long)]
    pub out_name: Option<String>,

    /// Folder prefix for per-run logs (overrides the file)
    #[arg(long)]
    pub log_path: Option<String>,

    /// Master seed the per-run seeds are drawn from (default: time-based)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Never give a packet fewer attempts than this (default: no floor)
    #[arg(long)]
    pub min_budget: Option<i64>,

    #[command(flatten)]
    pub params: StrategyArgs,
}

/// Configuration for trace generation
#[derive(Args, Debug, Clone)]
pub struct GenTraceArgs {
    /// Output trace file
    #[arg(long)]
    pub out: PathBuf,

    /// Number of records
    #[arg(long, default_value_t = 500)]
    pub records: usize,

    /// Random seed (default: time-based)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RunArgs {
    /// Resolve into a run configuration using `seed`.
    pub fn to_config(&self, seed: u64) -> SimulationConfig {
        SimulationConfig {
            in_path: self.in_path.clone(),
            out_path: self.out_path.clone(),
            log_path: self.log_path.clone(),
            avg_retry: self.retry.avg_retry,
            max_retry: self.retry.max_retry,
            min_budget: self.retry.min_budget,
            seed,
            strategy: self.params.resolve(self.strategy),
        }
    }
}

/// Explicit seed, or one derived from the wall clock.
pub fn seed_or_time(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    })
}

/// Print the configuration in human-readable form.
pub fn print_config(config: &SimulationConfig) {
    let show = |p: &Option<PathBuf>| p.as_ref().map_or("(none)".to_string(), |p| p.display().to_string());

    println!("=== Configuration ===");
    println!("Trace:   {}", config.in_path.display());
    println!("Metrics: {}", show(&config.out_path));
    println!("Log:     {}", show(&config.log_path));
    println!();
    println!("=== Retry Budget ===");
    println!("Average attempts: {}", config.avg_retry);
    println!("Max extra attempts: {}", config.max_retry);
    match config.min_budget {
        Some(floor) => println!("Budget floor: {floor}"),
        None => println!("Budget floor: none"),
    }
    println!();
    println!("=== Strategy ===");
    println!("Seed: {}", config.seed);
    match config.strategy {
        StrategyConfig::EpsilonGreedy(p) => println!("EG: eps={} alpha={}", p.eps, p.alpha),
        StrategyConfig::Boltzmann(p) => println!("BE: tau={} alpha={}", p.tau, p.alpha),
        StrategyConfig::DiscountedUcb(p) => {
            println!("D-UCB: gamma={} xi={} B={}", p.gamma, p.xi, p.b)
        }
        StrategyConfig::ThreeM(p) => println!("3M: w={} tau={}", p.w, p.tau),
        StrategyConfig::Random => println!("rand"),
        StrategyConfig::Best => println!("best"),
    }
    println!();
}
