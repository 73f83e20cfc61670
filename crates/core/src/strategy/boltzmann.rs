//! Boltzmann (softmax) exploration.

use super::{sample_weighted, SelectionPolicy};
use crate::channel::TxStatus;
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoltzmannParams {
    /// Temperature
    pub tau: f64,

    /// Learning rate of the value estimate
    pub alpha: f64,
}

impl Default for BoltzmannParams {
    fn default() -> Self {
        Self {
            tau: 0.1,
            alpha: 0.1,
        }
    }
}

/// Samples each modulation with probability proportional to `exp(Q / tau)`.
///
/// A temperature small enough to overflow the exponential degrades to a
/// greedy choice on `Q`.
#[derive(Debug, Clone)]
pub struct Boltzmann {
    params: BoltzmannParams,
    q: ModulationMap<f64>,
}

impl Boltzmann {
    pub fn new(params: BoltzmannParams) -> Self {
        Self {
            params,
            q: ModulationMap::splat(1.0),
        }
    }

    /// Selection probabilities for the current estimates.
    pub fn probabilities(&self) -> ModulationMap<f64> {
        let weights = self.weights();
        let total = weights.sum();
        weights.map(|_, w| w / total)
    }

    pub fn estimates(&self) -> &ModulationMap<f64> {
        &self.q
    }

    fn weights(&self) -> ModulationMap<f64> {
        self.q.map(|_, q| (q / self.params.tau).exp())
    }
}

impl SelectionPolicy for Boltzmann {
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation {
        let weights = self.weights();
        let candidates: Vec<(Modulation, f64)> = weights.iter().map(|(m, w)| (m, *w)).collect();
        sample_weighted(&candidates, rng)
    }

    fn update(&mut self, modulation: Modulation, status: TxStatus, _pdr: &ModulationMap<f64>) {
        let q = &mut self.q[modulation];
        *q += self.params.alpha * (status.reward() - *q);
    }
}
