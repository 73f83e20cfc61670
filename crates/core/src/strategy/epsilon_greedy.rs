//! Epsilon-greedy selection.

use super::{uniform_modulation, SelectionPolicy};
use crate::channel::TxStatus;
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedyParams {
    /// Exploration probability
    pub eps: f64,

    /// Learning rate of the value estimate
    pub alpha: f64,
}

impl Default for EpsilonGreedyParams {
    fn default() -> Self {
        Self {
            eps: 0.1,
            alpha: 0.1,
        }
    }
}

/// Greedy on the estimated reward, exploring uniformly with probability `eps`.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    params: EpsilonGreedyParams,
    q: ModulationMap<f64>,
}

impl EpsilonGreedy {
    /// Optimistic start: every estimate begins at 1.
    pub fn new(params: EpsilonGreedyParams) -> Self {
        Self {
            params,
            q: ModulationMap::splat(1.0),
        }
    }

    pub fn estimates(&self) -> &ModulationMap<f64> {
        &self.q
    }
}

impl SelectionPolicy for EpsilonGreedy {
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation {
        let trial: f64 = rng.gen();
        if trial > self.params.eps {
            self.q.argmax()
        } else {
            uniform_modulation(rng)
        }
    }

    fn update(&mut self, modulation: Modulation, status: TxStatus, _pdr: &ModulationMap<f64>) {
        let q = &mut self.q[modulation];
        *q += self.params.alpha * (status.reward() - *q);
    }
}
