//! Simulation loop.
//!
//! Composes the channel, the retry budget, the packet state machine and a
//! strategy into one run over a trace:
//!
//! ```text
//! prime window
//! while the trace has windows:
//!     budget  <- allocator
//!     packet  <- new, driven to termination by the strategy
//!     allocator.update(packet.retries)
//!     log row (optional)
//!     advance window
//! ```
//!
//! # Determinism
//!
//! The run owns a single ChaCha8 generator seeded from the config. The
//! channel and the strategy draw from it in a fixed order, so the same seed,
//! trace and parameters reproduce the same choices, outcomes and log.

use crate::allocator::RetryBudget;
use crate::channel::TraceChannel;
use crate::error::Result;
use crate::metrics::{append_metrics, RunReport, TransmissionLog};
use crate::modulation::Modulation;
use crate::packet::RunCounters;
use crate::strategy::{Strategy, StrategyConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};

/// Default average attempts per packet.
pub const DEFAULT_AVG_RETRY: u32 = 3;

/// Default cap on borrowed extra attempts.
pub const DEFAULT_MAX_RETRY: u32 = 9;

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Trace file to replay
    pub in_path: PathBuf,

    /// Metrics file the `PDR<TAB>RNP` line is appended to
    pub out_path: Option<PathBuf>,

    /// Per-packet transmission log
    pub log_path: Option<PathBuf>,

    /// Average attempts per packet
    pub avg_retry: u32,

    /// Maximum extra attempts a packet may borrow
    pub max_retry: u32,

    /// Lower bound on the per-packet budget (off by default)
    pub min_budget: Option<i64>,

    /// Seed of the run's random generator
    pub seed: u64,

    /// Selection strategy and its hyperparameters
    pub strategy: StrategyConfig,
}

impl SimulationConfig {
    /// Config with default retry settings and seed 0.
    pub fn new(in_path: impl Into<PathBuf>, strategy: StrategyConfig) -> Self {
        Self {
            in_path: in_path.into(),
            out_path: None,
            log_path: None,
            avg_retry: DEFAULT_AVG_RETRY,
            max_retry: DEFAULT_MAX_RETRY,
            min_budget: None,
            seed: 0,
            strategy,
        }
    }
}

/// A run in progress.
pub struct Simulation<R> {
    channel: TraceChannel<R>,
    strategy: Strategy,
    budget: RetryBudget,
    counters: RunCounters,
    rng: ChaCha8Rng,
    log: Option<TransmissionLog>,
    seed: u64,
    primed: bool,
}

impl Simulation<BufReader<File>> {
    /// Open the trace. A configured transmission log is created with its
    /// first row.
    ///
    /// # Errors
    /// `Error::Io` if the trace cannot be opened; the run never starts.
    pub fn open(config: &SimulationConfig) -> Result<Self> {
        let channel = TraceChannel::open(&config.in_path)?;
        let mut sim = Self::with_channel(channel, config);
        if let Some(path) = &config.log_path {
            sim.log = Some(TransmissionLog::new(path));
        }
        Ok(sim)
    }
}

impl<R: BufRead> Simulation<R> {
    /// Build a run over an in-memory or already-open trace. No log is kept.
    pub fn from_reader(reader: R, config: &SimulationConfig) -> Self {
        Self::with_channel(TraceChannel::from_reader(reader), config)
    }

    fn with_channel(channel: TraceChannel<R>, config: &SimulationConfig) -> Self {
        Self {
            channel,
            strategy: config.strategy.build(),
            budget: RetryBudget::new(config.avg_retry, config.max_retry)
                .with_floor(config.min_budget),
            counters: RunCounters::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            log: None,
            seed: config.seed,
            primed: false,
        }
    }

    /// Send one packet to termination.
    ///
    /// # Returns
    /// - `Ok(Some(modulation))`: the modulation of the packet's last attempt
    /// - `Ok(None)`: the trace is exhausted
    pub fn step(&mut self) -> Result<Option<Modulation>> {
        if !self.primed {
            self.channel.advance_window()?;
            self.primed = true;
        }
        if !self.channel.has_transmissions() {
            return Ok(None);
        }

        let mut packet = self.counters.begin_packet(self.budget.get_tx_number());
        let modulation = packet.run(
            &mut self.strategy,
            &mut self.channel,
            &mut self.rng,
            &mut self.counters,
        );
        self.budget.update(packet.retries);

        if let Some(log) = &mut self.log {
            log.record(modulation, &self.counters)?;
        }

        self.channel.advance_window()?;
        Ok(Some(modulation))
    }

    /// Run until the trace is exhausted.
    pub fn run(mut self) -> Result<RunReport> {
        let start = Instant::now();
        debug!(
            strategy = %self.strategy.kind(),
            seed = self.seed,
            n_avg = self.budget.n_avg(),
            n_max = self.budget.n_max(),
            "simulation started"
        );

        while self.step()?.is_some() {}

        if let Some(log) = self.log.take() {
            log.finish()?;
        }

        let metrics = self.counters.metrics();
        match &metrics {
            Some(m) => debug!(
                packets = self.counters.packets,
                pdr = m.pdr,
                rnp = m.rnp,
                "simulation finished"
            ),
            None => warn!(strategy = %self.strategy.kind(), "no packets in trace, metrics undefined"),
        }

        Ok(RunReport {
            strategy: self.strategy.kind(),
            seed: self.seed,
            counters: self.counters,
            metrics,
            channel: self.channel.stats(),
            duration: start.elapsed(),
        })
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }
}

/// Run one simulation end to end and append its metrics line.
pub fn run_simulation(config: &SimulationConfig) -> Result<RunReport> {
    let report = Simulation::open(config)?.run()?;
    if let Some(out_path) = &config.out_path {
        append_metrics(out_path, report.metrics.as_ref())?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use std::io::Cursor;

    fn simulate(trace: &str, strategy: StrategyKind, seed: u64) -> RunReport {
        let mut config = SimulationConfig::new("unused", strategy.default_config());
        config.seed = seed;
        Simulation::from_reader(Cursor::new(trace.as_bytes().to_vec()), &config)
            .run()
            .unwrap()
    }

    #[test]
    fn test_perfect_trace() {
        // window of size 4 serves 5 packets
        let report = simulate("0\t4\t1\t1\t1\n", StrategyKind::Random, 1);
        assert_eq!(report.counters.packets, 5);
        assert_eq!(report.counters.received, 5);
        assert_eq!(report.counters.retries, 5);
        let metrics = report.metrics.unwrap();
        assert_eq!(metrics.pdr, 1.0);
        assert_eq!(metrics.rnp, 1.0);
    }

    #[test]
    fn test_dead_trace_uses_budget() {
        // each packet exhausts its budget; n_extra stays 0 so budget stays 3
        let report = simulate("0\t1\t0\t0\t0\n", StrategyKind::EpsilonGreedy, 1);
        assert_eq!(report.counters.packets, 2);
        assert_eq!(report.counters.received, 0);
        assert_eq!(report.counters.retries, 6);
    }

    #[test]
    fn test_empty_trace_has_no_metrics() {
        let report = simulate("", StrategyKind::Best, 1);
        assert_eq!(report.counters.packets, 0);
        assert!(report.metrics.is_none());
    }

    #[test]
    fn test_truncated_record_ends_run() {
        let trace = "0\t2\t1\t1\t1\n1\t5\t0.5\n2\t3\t1\t1\t1\n";
        let report = simulate(trace, StrategyKind::Random, 4);
        assert_eq!(report.counters.packets, 3);
        assert_eq!(report.counters.received, 3);
        assert_eq!(report.channel.windows_loaded, 1);
        assert!(report.metrics.is_some());
    }

    #[test]
    fn test_budget_credit_flows_between_packets() {
        let mut config = SimulationConfig::new("unused", StrategyConfig::Best);
        config.avg_retry = 3;
        config.max_retry = 9;
        let mut sim = Simulation::from_reader(Cursor::new(b"0\t3\t1\t1\t1\n".to_vec()), &config);

        sim.step().unwrap();
        assert_eq!(sim.budget().n_extra(), 2);
        sim.step().unwrap();
        assert_eq!(sim.budget().n_extra(), 4);
        assert_eq!(sim.budget().get_tx_number(), 7);
    }

    #[test]
    fn test_same_seed_same_result() {
        let trace = "0\t20\t0.6\t0.3\t0.9\n1\t90\t1\t1\t1\n2\t20\t0.2\t0.8\t0.4\n";
        for kind in StrategyKind::ALL {
            let a = simulate(trace, kind, 99);
            let b = simulate(trace, kind, 99);
            assert_eq!(a.counters, b.counters, "{kind} diverged");
        }
    }

    #[test]
    fn test_step_after_exhaustion() {
        let config = SimulationConfig::new("unused", StrategyConfig::Random);
        let mut sim = Simulation::from_reader(Cursor::new(b"0\t0\t1\t1\t1\n".to_vec()), &config);

        assert!(sim.step().unwrap().is_some());
        assert!(sim.step().unwrap().is_none());
        assert!(sim.step().unwrap().is_none());
        assert_eq!(sim.counters().packets, 1);
    }
}
