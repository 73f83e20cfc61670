//! Energy-aware retry budget.
//!
//! Consecutive packets share a single credit, `n_extra`. A packet that used
//! fewer than `n_avg` attempts leaves slack for later packets; one that used
//! more borrows from them. The per-packet budget is
//! `n_avg + min(n_max, n_extra)`.
//!
//! `n_extra` is never clamped, so a run of expensive packets can push the
//! budget to zero or below. An optional floor bounds the returned budget
//! without touching the credit itself.

/// Running retry credit shared across the packets of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    n_avg: i64,
    n_max: i64,
    n_extra: i64,
    floor: Option<i64>,
}

impl RetryBudget {
    /// Create an allocator with no accumulated credit.
    pub fn new(n_avg: u32, n_max: u32) -> Self {
        Self {
            n_avg: i64::from(n_avg),
            n_max: i64::from(n_max),
            n_extra: 0,
            floor: None,
        }
    }

    /// Never hand out fewer than `floor` attempts.
    pub fn with_floor(mut self, floor: Option<i64>) -> Self {
        self.floor = floor;
        self
    }

    /// Attempts allowed for the next packet.
    pub fn get_tx_number(&self) -> i64 {
        let budget = self.n_avg + self.n_max.min(self.n_extra);
        match self.floor {
            Some(floor) => budget.max(floor),
            None => budget,
        }
    }

    /// Settle a finished packet that used `n_used` attempts.
    pub fn update(&mut self, n_used: u32) {
        self.n_extra += self.n_avg - i64::from(n_used);
    }

    pub fn n_avg(&self) -> i64 {
        self.n_avg
    }

    pub fn n_max(&self) -> i64 {
        self.n_max
    }

    /// Accumulated credit (may be negative).
    pub fn n_extra(&self) -> i64 {
        self.n_extra
    }
}
