//! Sweep driver: every sensor x strategy x replication.
//!
//! Reads a JSON parameters file, runs one simulation per combination and
//! collects all metrics lines in a single output file:
//!
//! ```text
//! <sensor>
//! <strategy>
//! PDR<TAB>RNP        one line per replication
//! ...
//! <strategy>
//! ...
//! <sensor>
//! ...
//! ```
//!
//! Runs execute in-process and in order, so the output file layout is
//! stable. Each run gets its own seed, drawn from a master generator.

use crate::config::{seed_or_time, SweepArgs};
use crate::error::AppError;
use modsim_core::{run_simulation, SimulationConfig, StrategyConfig, StrategyKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Contents of the sweep parameters file.
///
/// Unknown keys (such as a `strategies_path` left over from script-based
/// drivers) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepParams {
    /// Space-separated sensor names
    pub sensors: String,

    /// Space-separated strategy names
    pub strategies: String,

    /// Prefix of the trace files, `{input_path}pdr_phy_{sensor}.txt`
    pub input_path: String,

    #[serde(deserialize_with = "int_or_string")]
    pub avg_number_retries: u32,

    #[serde(deserialize_with = "int_or_string")]
    pub max_number_retries: u32,

    #[serde(deserialize_with = "int_or_string")]
    pub replications: u32,

    /// Prefix of the output file
    pub out_name: String,

    /// Prefix of the log folders; empty disables logging
    #[serde(default)]
    pub log_path: Option<String>,
}

/// Parameter files written by hand often quote their numbers.
fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl SweepParams {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// A fully resolved sweep.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub sensors: Vec<String>,
    /// Strategy name as written in the parameters file, and its config
    pub strategies: Vec<(String, StrategyConfig)>,
    pub input_path: String,
    pub avg_retry: u32,
    pub max_retry: u32,
    pub min_budget: Option<i64>,
    pub replications: u32,
    pub out_name: String,
    pub log_path: Option<String>,
    pub seed: u64,
}

impl SweepPlan {
    /// Combine the parameters file with command-line overrides.
    pub fn resolve(params: SweepParams, args: &SweepArgs) -> Result<Self, AppError> {
        let strategies = params
            .strategies
            .split_whitespace()
            .map(|name| {
                let kind: StrategyKind = name.parse()?;
                Ok((name.to_string(), args.params.resolve(kind)))
            })
            .collect::<Result<Vec<_>, modsim_core::Error>>()?;

        let log_path = args
            .log_path
            .clone()
            .or(params.log_path)
            .filter(|p| !p.is_empty());

        Ok(Self {
            sensors: params.sensors.split_whitespace().map(String::from).collect(),
            strategies,
            input_path: params.input_path,
            avg_retry: args.n_avg.unwrap_or(params.avg_number_retries),
            max_retry: args.n_max.unwrap_or(params.max_number_retries),
            min_budget: args.min_budget,
            replications: args.replications.unwrap_or(params.replications),
            out_name: args.out_name.clone().unwrap_or(params.out_name),
            log_path,
            seed: seed_or_time(args.seed),
        })
    }

    /// `{out_name}_output_{replications}rep_{avg_retry}rt.txt`
    pub fn out_path(&self) -> PathBuf {
        PathBuf::from(format!(
            "{}_output_{}rep_{}rt.txt",
            self.out_name, self.replications, self.avg_retry
        ))
    }

    pub fn trace_path(&self, sensor: &str) -> PathBuf {
        PathBuf::from(format!("{}pdr_phy_{}.txt", self.input_path, sensor))
    }

    fn log_folder(&self, strategy: &str) -> Option<PathBuf> {
        self.log_path
            .as_ref()
            .map(|prefix| PathBuf::from(format!("{prefix}{strategy}")))
    }
}

/// Outcome of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub out_path: PathBuf,
    pub runs: usize,
    pub failed: usize,
}

/// Execute every run of `plan`.
///
/// A run whose trace cannot be read is logged and counted as failed; the
/// sweep moves on to the next combination.
pub fn run_sweep(plan: &SweepPlan) -> Result<SweepSummary, AppError> {
    let out_path = plan.out_path();
    if out_path.exists() {
        fs::remove_file(&out_path)?;
    }

    let mut master = ChaCha8Rng::seed_from_u64(plan.seed);
    let mut summary = SweepSummary {
        out_path: out_path.clone(),
        runs: 0,
        failed: 0,
    };

    info!(seed = plan.seed, out = %out_path.display(), "sweep started");

    for sensor in &plan.sensors {
        let trace = plan.trace_path(sensor);
        append_line(&out_path, sensor)?;

        for (name, strategy) in &plan.strategies {
            let log_folder = plan.log_folder(name);
            if let Some(folder) = &log_folder {
                fs::create_dir_all(folder)?;
            }
            append_line(&out_path, name)?;

            for k in 0..plan.replications {
                let log_path = match &log_folder {
                    Some(folder) => {
                        let path = folder.join(format!("{name}_{sensor}_{k}.tsv"));
                        if path.exists() {
                            fs::remove_file(&path)?;
                        }
                        Some(path)
                    }
                    None => None,
                };

                let config = SimulationConfig {
                    in_path: trace.clone(),
                    out_path: Some(out_path.clone()),
                    log_path,
                    avg_retry: plan.avg_retry,
                    max_retry: plan.max_retry,
                    min_budget: plan.min_budget,
                    seed: master.gen(),
                    strategy: *strategy,
                };

                summary.runs += 1;
                match run_simulation(&config) {
                    Ok(report) => info!(
                        %sensor,
                        strategy = %name,
                        replication = k,
                        seed = config.seed,
                        metrics = ?report.metrics,
                        "run finished"
                    ),
                    Err(err) => {
                        summary.failed += 1;
                        error!(%sensor, strategy = %name, replication = k, %err, "run failed");
                    }
                }
            }
        }
    }

    Ok(summary)
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}
