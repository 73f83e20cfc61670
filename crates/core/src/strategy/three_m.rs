//! 3M: windowed recency sampling with a one-step ban on the last failure.
//!
//! Each modulation keeps its last `tau` binary outcomes. The modulation that
//! just failed is excluded from the next choice. Among the rest, an arm with
//! no history is tried first; otherwise arms are sampled with weight
//! `(1 + mean)^w` over their window.

use super::{sample_weighted, SelectionPolicy};
use crate::channel::TxStatus;
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeMParams {
    /// Exponent sharpening the preference for good arms
    pub w: f64,

    /// Outcomes remembered per modulation
    pub tau: usize,
}

impl Default for ThreeMParams {
    fn default() -> Self {
        Self { w: 2.0, tau: 10 }
    }
}

#[derive(Debug, Clone)]
pub struct ThreeM {
    params: ThreeMParams,
    history: ModulationMap<VecDeque<bool>>,
    a_bad: Option<Modulation>,
}

impl ThreeM {
    pub fn new(params: ThreeMParams) -> Self {
        Self {
            params,
            history: ModulationMap::from_fn(|_| VecDeque::new()),
            a_bad: None,
        }
    }

    /// Modulation banned from the next choice, if any.
    pub fn a_bad(&self) -> Option<Modulation> {
        self.a_bad
    }

    /// Fraction of acknowledged attempts in the window of `m`.
    pub fn ack_ratio(&self, m: Modulation) -> Option<f64> {
        let window = &self.history[m];
        if window.is_empty() {
            return None;
        }
        let acked = window.iter().filter(|&&ack| ack).count();
        Some(acked as f64 / window.len() as f64)
    }

    fn candidates(&self) -> Vec<Modulation> {
        let allowed: Vec<Modulation> = Modulation::ALL
            .into_iter()
            .filter(|&m| Some(m) != self.a_bad)
            .collect();
        if allowed.is_empty() {
            Modulation::ALL.to_vec()
        } else {
            allowed
        }
    }
}

impl SelectionPolicy for ThreeM {
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation {
        let candidates = self.candidates();

        let mut weights = Vec::with_capacity(candidates.len());
        for m in candidates {
            match self.ack_ratio(m) {
                None => return m,
                Some(ratio) => weights.push((m, (1.0 + ratio).powf(self.params.w))),
            }
        }

        sample_weighted(&weights, rng)
    }

    fn update(&mut self, modulation: Modulation, status: TxStatus, _pdr: &ModulationMap<f64>) {
        let window = &mut self.history[modulation];
        window.push_back(status.ack_delivered);
        while window.len() > self.params.tau {
            window.pop_front();
        }

        self.a_bad = if status.ack_delivered {
            None
        } else {
            Some(modulation)
        };
    }
}
