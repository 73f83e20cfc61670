//! Trace-driven channel model.
//!
//! Replays a pre-recorded channel-quality trace and simulates delivery of
//! packets and acknowledgements for a chosen modulation.
//!
//! # Trace Format
//!
//! ```text
//! index <TAB> window_size <TAB> pdr_FSK <TAB> pdr_OQPSK <TAB> pdr_OFDM
//! ```
//!
//! A line with fewer than five fields marks the end of the trace, whether it
//! is blank or a truncated record.
//! Windows whose size is at least [`MAX_WINDOW_SIZE`] are unreliable samples
//! and are skipped while reading.
//!
//! # Window Slots
//!
//! A loaded window serves one packet per call to
//! [`TraceChannel::advance_window`] until `size` slots have been used; the
//! next call reads a fresh record.
//!
//! # Determinism
//!
//! The model holds no random state of its own. Every draw comes from the
//! generator passed to [`TraceChannel::transmit`], so a seeded generator and
//! the same trace give bit-identical outcomes.

use crate::error::{Result, TraceError};
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, trace};

/// Windows of this size or larger are skipped.
pub const MAX_WINDOW_SIZE: u32 = 75;

/// Fields in a usable trace record.
pub const RECORD_FIELDS: usize = 5;

/// One PDR snapshot from the trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Number of transmissions the snapshot was sampled over
    pub size: u32,

    /// Delivery probability per modulation, each in [0, 1]
    pub pdr: ModulationMap<f64>,
}

impl Window {
    /// Parse one trace line.
    ///
    /// # Returns
    /// - `Ok(None)` if the line has fewer than [`RECORD_FIELDS`] fields
    /// - `Ok(Some(window))` for a well-formed record
    ///
    /// # Errors
    /// `TraceError` if a full-width record cannot be used.
    pub fn parse(line: &str, line_no: usize) -> std::result::Result<Option<Self>, TraceError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < RECORD_FIELDS {
            if fields.len() > 1 {
                debug!(line = line_no, fields = fields.len(), "short record ends the trace");
            }
            return Ok(None);
        }

        let size_field = fields[1].trim();
        let size = size_field
            .parse::<u32>()
            .map_err(|_| TraceError::InvalidNumber {
                line: line_no,
                field: "window_size",
                value: size_field.to_string(),
            })?;

        let mut pdr = ModulationMap::splat(0.0);
        for (m, field) in Modulation::ALL.into_iter().zip(&fields[2..RECORD_FIELDS]) {
            let field = field.trim();
            let value = field.parse::<f64>().map_err(|_| TraceError::InvalidNumber {
                line: line_no,
                field: m.as_str(),
                value: field.to_string(),
            })?;
            if !(0.0..=1.0).contains(&value) {
                return Err(TraceError::PdrOutOfRange {
                    line: line_no,
                    modulation: m.as_str(),
                    value,
                });
            }
            pdr[m] = value;
        }

        Ok(Some(Window { size, pdr }))
    }

    /// Whether the window is small enough to be used.
    pub fn is_reliable(&self) -> bool {
        self.size < MAX_WINDOW_SIZE
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            size: 0,
            pdr: ModulationMap::splat(0.0),
        }
    }
}

/// Outcome of a single transmission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxStatus {
    /// Packet reached the receiver
    pub pkt_delivered: bool,

    /// Acknowledgement made it back (implies `pkt_delivered`)
    pub ack_delivered: bool,
}

impl TxStatus {
    /// Binary reward fed to the strategies.
    pub fn reward(&self) -> f64 {
        if self.ack_delivered {
            1.0
        } else {
            0.0
        }
    }
}

/// Trace-driven channel.
///
/// # Thread Safety
/// Not thread-safe; each simulation run owns its own instance.
pub struct TraceChannel<R> {
    reader: R,
    line_no: usize,
    line: String,
    window: Window,
    attempts_in_window: u32,
    exhausted: bool,
    stats: ChannelStats,
}

impl TraceChannel<BufReader<File>> {
    /// Open a trace file.
    ///
    /// # Errors
    /// `Error::Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceChannel<R> {
    /// Create a channel reading records from `reader`.
    ///
    /// No window is loaded until the first [`advance_window`](Self::advance_window).
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            line: String::new(),
            window: Window::default(),
            attempts_in_window: 0,
            exhausted: false,
            stats: ChannelStats::default(),
        }
    }

    /// Move to the next packet slot, loading a new window when the current
    /// one is used up.
    ///
    /// Reaching the end of the trace is not an error: it clears
    /// [`has_transmissions`](Self::has_transmissions).
    pub fn advance_window(&mut self) -> Result<()> {
        if self.attempts_in_window < self.window.size {
            self.attempts_in_window += 1;
            return Ok(());
        }

        self.attempts_in_window = 0;
        loop {
            self.line.clear();
            self.reader.read_line(&mut self.line)?;
            self.line_no += 1;

            let Some(window) = Window::parse(&self.line, self.line_no)? else {
                debug!(line = self.line_no, "end of trace");
                self.exhausted = true;
                return Ok(());
            };

            self.window = window;
            if window.is_reliable() {
                self.stats.windows_loaded += 1;
                return Ok(());
            }

            self.stats.windows_skipped += 1;
            debug!(line = self.line_no, size = window.size, "skipped oversized window");
        }
    }

    /// Simulate one packet + ACK exchange with `modulation`.
    ///
    /// The packet leg succeeds iff a uniform draw is `<= pdr[modulation]`.
    /// The ACK leg is drawn only after a delivered packet, against the same
    /// PDR. A PDR of exactly zero never delivers.
    pub fn transmit<G: Rng + ?Sized>(&mut self, modulation: Modulation, rng: &mut G) -> TxStatus {
        let pdr = self.window.pdr[modulation];
        let mut status = TxStatus::default();

        let trial: f64 = rng.gen();
        if pdr > 0.0 && trial <= pdr {
            status.pkt_delivered = true;
            let trial: f64 = rng.gen();
            status.ack_delivered = trial <= pdr;
        }

        self.stats.attempts += 1;
        self.stats.pkt_delivered += u64::from(status.pkt_delivered);
        self.stats.ack_delivered += u64::from(status.ack_delivered);
        trace!(
            %modulation,
            pdr,
            pkt = status.pkt_delivered,
            ack = status.ack_delivered,
            "transmit"
        );

        status
    }

    /// False once the trace is exhausted.
    pub fn has_transmissions(&self) -> bool {
        !self.exhausted
    }

    /// Ground-truth PDR of the current window.
    pub fn pdr(&self) -> &ModulationMap<f64> {
        &self.window.pdr
    }

    /// Current window.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Get statistics about channel behavior.
    pub fn stats(&self) -> ChannelStats {
        self.stats
    }
}

/// Statistics about channel replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Windows loaded and used
    pub windows_loaded: u64,

    /// Windows skipped for being oversized
    pub windows_skipped: u64,

    /// Transmission attempts simulated
    pub attempts: u64,

    /// Attempts where the packet was delivered
    pub pkt_delivered: u64,

    /// Attempts where the ACK came back
    pub ack_delivered: u64,
}

impl ChannelStats {
    /// Fraction of attempts acknowledged.
    pub fn ack_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.ack_delivered as f64 / self.attempts as f64
        }
    }
}
