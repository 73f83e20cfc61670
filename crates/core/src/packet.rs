//! Packet retry state machine.
//!
//! A packet is created with a fixed attempt budget and driven through
//! transmission attempts until it terminates:
//!
//! ```text
//!              attempt (no ACK, retries < budget)
//!                  +-------+
//!                  |       |
//!                  v       |
//! init ----> AwaitingTx ---+
//!                  |
//!                  | ACK received, or retries >= budget
//!                  v
//!              Terminated
//! ```
//!
//! # Counting Rules
//!
//! - Every attempt increments both the packet's and the run's retry count.
//! - The first attempt whose packet leg is delivered counts the packet as
//!   received; later deliveries of the same packet are not recounted.
//! - At least one attempt is always made, even with a non-positive budget.

use crate::channel::{TraceChannel, TxStatus};
use crate::metrics::RunMetrics;
use crate::modulation::Modulation;
use crate::strategy::SelectionPolicy;
use rand::Rng;
use serde::Serialize;
use std::io::BufRead;

/// Lifecycle of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketState {
    /// More attempts may follow
    AwaitingTx,

    /// ACK received or budget exhausted
    Terminated,
}

/// A single packet and its per-packet counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// 1-based sequence number within the run
    pub id: u64,

    /// Attempts made so far
    pub retries: u32,

    /// Attempt budget fixed at creation
    pub budget: i64,

    /// Whether some attempt already delivered the packet leg
    pub first_delivery_seen: bool,

    state: PacketState,
}

impl Packet {
    /// Create a packet awaiting its first attempt.
    pub fn new(id: u64, budget: i64) -> Self {
        Self {
            id,
            retries: 0,
            budget,
            first_delivery_seen: false,
            state: PacketState::AwaitingTx,
        }
    }

    pub fn state(&self) -> PacketState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == PacketState::Terminated
    }

    /// Account for one attempt and advance the state machine.
    pub fn record(&mut self, status: TxStatus, counters: &mut RunCounters) -> PacketState {
        counters.retries += 1;
        self.retries += 1;

        if status.pkt_delivered && !self.first_delivery_seen {
            counters.received += 1;
            self.first_delivery_seen = true;
        }

        if status.ack_delivered || i64::from(self.retries) >= self.budget {
            self.state = PacketState::Terminated;
        }

        self.state
    }

    /// Drive the packet to termination.
    ///
    /// Each attempt asks `strategy` for a modulation, transmits on `channel`,
    /// feeds the outcome back to the strategy and updates `counters`.
    ///
    /// # Returns
    /// The modulation used on the final attempt.
    pub fn run<S, R, G>(
        &mut self,
        strategy: &mut S,
        channel: &mut TraceChannel<R>,
        rng: &mut G,
        counters: &mut RunCounters,
    ) -> Modulation
    where
        S: SelectionPolicy,
        R: BufRead,
        G: Rng + ?Sized,
    {
        loop {
            let modulation = strategy.select(rng);
            let status = channel.transmit(modulation, rng);
            strategy.update(modulation, status, channel.pdr());

            self.record(status, counters);
            if self.is_terminated() {
                return modulation;
            }
        }
    }
}

/// Run-level counters, read at the end to compute PDR and RNP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Distinct packets started
    pub packets: u64,

    /// Distinct packets delivered at least once
    pub received: u64,

    /// Transmission attempts across all packets
    pub retries: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new packet and hand it back with `budget` attempts.
    pub fn begin_packet(&mut self, budget: i64) -> Packet {
        self.packets += 1;
        Packet::new(self.packets, budget)
    }

    /// Aggregate PDR/RNP, or `None` if no packet was processed.
    pub fn metrics(&self) -> Option<RunMetrics> {
        RunMetrics::from_counters(self)
    }
}
