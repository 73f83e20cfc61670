//! Run metrics and the flat files they are written to.
//!
//! - **Metrics file**: one `PDR<TAB>RNP` line appended per run.
//! - **Transmission log**: optional TSV with one row per finished packet,
//!   holding the last modulation used and the running PDR/RNP.
//!
//! Both files are append-only. A run with zero packets has no defined
//! PDR/RNP; it is reported as `None` and written as `None<TAB>None`.

use crate::channel::ChannelStats;
use crate::error::Result;
use crate::modulation::Modulation;
use crate::packet::RunCounters;
use crate::strategy::StrategyKind;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Header row of the transmission log.
pub const LOG_HEADER: &str = "a_phy\tPDR\tRNT\n";

/// Aggregate delivery figures of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Distinct packets delivered / distinct packets
    pub pdr: f64,

    /// Transmission attempts / distinct packets
    pub rnp: f64,
}

impl RunMetrics {
    /// Compute metrics, or `None` when no packet was processed.
    pub fn from_counters(counters: &RunCounters) -> Option<Self> {
        if counters.packets == 0 {
            return None;
        }
        let packets = counters.packets as f64;
        Some(Self {
            pdr: counters.received as f64 / packets,
            rnp: counters.retries as f64 / packets,
        })
    }

    /// `PDR<TAB>RNP` line as written to the metrics file.
    pub fn to_line(metrics: Option<&Self>) -> String {
        match metrics {
            Some(m) => format!("{}\t{}\n", format_value(m.pdr), format_value(m.rnp)),
            None => "None\tNone\n".to_string(),
        }
    }
}

/// Shortest round-trip float formatting, keeping `.0` on integral values.
///
/// Exponents carry an explicit sign and at least two digits (`5e-06`,
/// `1e+16`), matching the metrics files produced by earlier tooling.
pub fn format_value(value: f64) -> String {
    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Append one metrics line to `path`.
pub fn append_metrics(path: &Path, metrics: Option<&RunMetrics>) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(RunMetrics::to_line(metrics).as_bytes())?;
    Ok(())
}

/// Per-packet transmission log.
///
/// The file is opened on the first row, so a run without packets leaves
/// no log behind.
pub struct TransmissionLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl TransmissionLog {
    /// Log to `path`, appending if the file already exists.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            rows: 0,
        }
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => {
                let is_new = !self.path.exists();
                let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
                let mut writer = BufWriter::new(file);
                if is_new {
                    writer.write_all(LOG_HEADER.as_bytes())?;
                }
                writer
            }
        };
        Ok(self.writer.insert(writer))
    }

    /// Log a finished packet.
    pub fn record(&mut self, modulation: Modulation, counters: &RunCounters) -> Result<()> {
        let (pdr, rnp) = match counters.metrics() {
            Some(m) => (format_value(m.pdr), format_value(m.rnp)),
            None => ("None".to_string(), "None".to_string()),
        };
        writeln!(self.writer()?, "{modulation}\t{pdr}\t{rnp}")?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn finish(self) -> Result<()> {
        if let Some(mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    /// Rows written since opening.
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

/// Everything known about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub strategy: StrategyKind,
    pub seed: u64,
    pub counters: RunCounters,
    pub metrics: Option<RunMetrics>,
    pub channel: ChannelStats,
    #[serde(skip)]
    pub duration: Duration,
}

impl RunReport {
    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Run Summary ===");
        println!("Strategy: {}", self.strategy);
        println!("Seed: {}", self.seed);
        println!("Duration: {} ms", self.duration.as_millis());
        println!();

        println!("=== Packets ===");
        println!("Packets: {}", self.counters.packets);
        println!("Received: {}", self.counters.received);
        println!("Attempts: {}", self.counters.retries);
        match &self.metrics {
            Some(m) => {
                println!("PDR: {:.4}", m.pdr);
                println!("RNP: {:.4}", m.rnp);
            }
            None => println!("PDR/RNP: no data"),
        }
        println!();

        println!("=== Channel ===");
        println!("Windows used: {}", self.channel.windows_loaded);
        println!("Windows skipped: {}", self.channel.windows_skipped);
        println!("ACK rate per attempt: {:.2}%", self.channel.ack_rate() * 100.0);
        println!();
    }

    /// Export as simple `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        let (pdr, rnp) = match &self.metrics {
            Some(m) => (format_value(m.pdr), format_value(m.rnp)),
            None => ("None".to_string(), "None".to_string()),
        };
        format!(
            "strategy={}\n\
             seed={}\n\
             packets={}\n\
             received={}\n\
             retries={}\n\
             pdr={}\n\
             rnp={}\n\
             windows_loaded={}\n\
             windows_skipped={}\n",
            self.strategy,
            self.seed,
            self.counters.packets,
            self.counters.received,
            self.counters.retries,
            pdr,
            rnp,
            self.channel.windows_loaded,
            self.channel.windows_skipped,
        )
    }
}
