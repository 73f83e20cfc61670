//! Integration tests for full simulation runs.
//!
//! These tests write traces to temporary files and drive whole runs through
//! `run_simulation`: trace -> strategy -> channel -> counters -> metrics
//! and log files.

use modsim_core::{
    channel::TraceChannel,
    run_simulation,
    strategy::{DiscountedUcbParams, EpsilonGreedyParams},
    Error, Modulation, SimulationConfig, StrategyConfig, StrategyKind,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write `records` as a trace file in `dir` and return its path.
fn write_trace(dir: &Path, name: &str, records: &[(u32, f64, f64, f64)]) -> PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    for (i, (size, fsk, oqpsk, ofdm)) in records.iter().enumerate() {
        writeln!(file, "{i}\t{size}\t{fsk}\t{oqpsk}\t{ofdm}").unwrap();
    }
    path
}

fn mixed_trace(dir: &Path) -> PathBuf {
    write_trace(
        dir,
        "pdr_phy_mixed.txt",
        &[
            (30, 0.9, 0.4, 0.1),
            (80, 0.0, 0.0, 0.0),
            (20, 0.2, 0.95, 0.5),
            (10, 0.05, 0.1, 0.7),
            (40, 0.6, 0.6, 0.6),
        ],
    )
}

/// Test that every strategy completes a run and keeps the counter invariants.
#[test]
fn test_all_strategies_complete() {
    let dir = TempDir::new().unwrap();
    let trace = mixed_trace(dir.path());

    for kind in StrategyKind::ALL {
        let mut config = SimulationConfig::new(&trace, kind.default_config());
        config.seed = 2024;
        let report = run_simulation(&config).expect("run failed");

        assert!(report.counters.packets > 0);
        assert!(report.counters.received <= report.counters.packets);
        assert!(report.counters.retries >= report.counters.packets);

        let metrics = report.metrics.expect("metrics missing");
        assert!((0.0..=1.0).contains(&metrics.pdr));
        assert!(metrics.rnp >= 1.0);
    }
}

/// An oversized window in front must behave exactly as if it were absent.
#[test]
fn test_oversized_window_equivalence() {
    let dir = TempDir::new().unwrap();
    let with_skip = write_trace(dir.path(), "a.txt", &[(80, 1.0, 1.0, 1.0), (10, 1.0, 1.0, 1.0)]);
    let without = write_trace(dir.path(), "b.txt", &[(10, 1.0, 1.0, 1.0)]);

    for kind in StrategyKind::ALL {
        let mut a = SimulationConfig::new(&with_skip, kind.default_config());
        let mut b = SimulationConfig::new(&without, kind.default_config());
        a.seed = 5;
        b.seed = 5;

        let ra = run_simulation(&a).unwrap();
        let rb = run_simulation(&b).unwrap();
        assert_eq!(ra.counters, rb.counters);
        assert_eq!(ra.channel.windows_skipped, 1);
        assert_eq!(rb.channel.windows_skipped, 0);
    }
}

/// Same seed, trace and parameters must give identical metrics and logs.
#[test]
fn test_reproducible_runs() {
    let dir = TempDir::new().unwrap();
    let trace = mixed_trace(dir.path());
    let out = dir.path().join("out.txt");

    let mut logs = Vec::new();
    for run in 0..2 {
        let log = dir.path().join(format!("run{run}.tsv"));
        let mut config = SimulationConfig::new(
            &trace,
            StrategyConfig::EpsilonGreedy(EpsilonGreedyParams { eps: 0.3, alpha: 0.2 }),
        );
        config.seed = 77;
        config.out_path = Some(out.clone());
        config.log_path = Some(log.clone());
        run_simulation(&config).unwrap();
        logs.push(fs::read_to_string(&log).unwrap());
    }

    assert_eq!(logs[0], logs[1]);
    assert!(logs[0].starts_with("a_phy\tPDR\tRNT\n"));

    let lines: Vec<_> = fs::read_to_string(&out).unwrap().lines().map(String::from).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
}

/// Different seeds should (for a noisy channel) explore differently.
#[test]
fn test_seed_changes_outcome() {
    let dir = TempDir::new().unwrap();
    let trace = mixed_trace(dir.path());

    let reports: Vec<_> = (0..4)
        .map(|seed| {
            let mut config = SimulationConfig::new(&trace, StrategyConfig::Random);
            config.seed = seed;
            run_simulation(&config).unwrap().counters
        })
        .collect();

    assert!(reports.windows(2).any(|w| w[0] != w[1]));
}

/// The log has one row per packet, naming a modulation and running metrics.
#[test]
fn test_log_rows_match_packets() {
    let dir = TempDir::new().unwrap();
    let trace = mixed_trace(dir.path());
    let log = dir.path().join("log.tsv");

    let mut config = SimulationConfig::new(&trace, StrategyConfig::Best);
    config.log_path = Some(log.clone());
    let report = run_simulation(&config).unwrap();

    let content = fs::read_to_string(&log).unwrap();
    let rows: Vec<_> = content.lines().skip(1).collect();
    assert_eq!(rows.len() as u64, report.counters.packets);

    for row in &rows {
        let fields: Vec<_> = row.split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].parse::<Modulation>().is_ok());
        let pdr: f64 = fields[1].parse().unwrap();
        assert!((0.0..=1.0).contains(&pdr));
    }

    // final row carries the final metrics
    let last: Vec<_> = rows.last().unwrap().split('\t').collect();
    let metrics = report.metrics.unwrap();
    assert_eq!(last[1].parse::<f64>().unwrap(), metrics.pdr);
    assert_eq!(last[2].parse::<f64>().unwrap(), metrics.rnp);
}

/// The oracle on a channel where one modulation is perfect never retries.
#[test]
fn test_oracle_on_clear_winner() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(dir.path(), "clear.txt", &[(50, 0.0, 1.0, 0.0)]);

    let config = SimulationConfig::new(&trace, StrategyConfig::Best);
    let report = run_simulation(&config).unwrap();

    // first attempt follows the uniform prior (FSK) and fails, the rest hit OQPSK
    assert_eq!(report.counters.packets, 51);
    assert_eq!(report.counters.received, 51);
    assert_eq!(report.counters.retries, 52);
}

/// D-UCB learns to prefer the good modulation on a stationary channel.
#[test]
fn test_ducb_beats_random_on_stationary_channel() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(
        dir.path(),
        "stationary.txt",
        &vec![(50, 0.1, 0.1, 0.95); 20],
    );

    let run = |strategy| {
        let mut config = SimulationConfig::new(&trace, strategy);
        config.seed = 31;
        run_simulation(&config).unwrap().metrics.unwrap()
    };

    let ducb = run(StrategyConfig::DiscountedUcb(DiscountedUcbParams::default()));
    let random = run(StrategyConfig::Random);
    assert!(ducb.rnp < random.rnp);
}

#[test]
fn test_empty_trace_reports_no_data() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(dir.path(), "empty.txt", &[]);
    let out = dir.path().join("out.txt");
    let log = dir.path().join("log.tsv");

    let mut config = SimulationConfig::new(&trace, StrategyConfig::Random);
    config.out_path = Some(out.clone());
    config.log_path = Some(log.clone());
    let report = run_simulation(&config).unwrap();

    assert!(report.metrics.is_none());
    assert_eq!(fs::read_to_string(&out).unwrap(), "None\tNone\n");
    assert!(!log.exists());
}

#[test]
fn test_missing_trace_is_fatal() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");

    let mut config = SimulationConfig::new(dir.path().join("nope.txt"), StrategyConfig::Random);
    config.out_path = Some(out.clone());

    assert!(matches!(run_simulation(&config), Err(Error::Io(_))));
    assert!(!out.exists());
}

#[test]
fn test_channel_open_reads_file() {
    let dir = TempDir::new().unwrap();
    let trace = write_trace(dir.path(), "one.txt", &[(5, 0.25, 0.5, 0.75)]);

    let mut channel = TraceChannel::open(&trace).unwrap();
    channel.advance_window().unwrap();
    assert!(channel.has_transmissions());
    assert_eq!(channel.pdr()[Modulation::Ofdm], 0.75);
}
