//! Modulation-selection strategies.
//!
//! Every strategy exposes the same two operations through
//! [`SelectionPolicy`]: pick a modulation for the next attempt, then learn
//! from the attempt's outcome. The reward is binary: 1 when the ACK came
//! back, 0 otherwise.
//!
//! | Kind | Selection | Learning |
//! |------|-----------|----------|
//! | [`EpsilonGreedy`] | greedy on `Q`, uniform with prob. `eps` | EMA with rate `alpha` |
//! | [`Boltzmann`] | softmax of `Q / tau` | EMA with rate `alpha` |
//! | [`DiscountedUcb`] | `Q + xi * sqrt(2 ln ΣN / N)` | discount all arms by `gamma` |
//! | [`ThreeM`] | recency-weighted sampling, last failure excluded | sliding window of `tau` outcomes |
//! | [`RandomChoice`] | uniform | none |
//! | [`Oracle`] | best ground-truth PDR | copies the channel PDR |
//!
//! The closed set of kinds is the [`Strategy`] enum, which dispatches to
//! the variant it holds. Each variant owns its parameters and state.

mod baseline;
mod boltzmann;
mod discounted_ucb;
mod epsilon_greedy;
mod three_m;

pub use baseline::{Oracle, RandomChoice};
pub use boltzmann::{Boltzmann, BoltzmannParams};
pub use discounted_ucb::{DiscountedUcb, DiscountedUcbParams};
pub use epsilon_greedy::{EpsilonGreedy, EpsilonGreedyParams};
pub use three_m::{ThreeM, ThreeMParams};

use crate::channel::TxStatus;
use crate::error::Error;
use crate::modulation::{argmax_of, Modulation, ModulationMap};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Choose a modulation, then learn from the result.
pub trait SelectionPolicy {
    /// Modulation for the next transmission attempt.
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation;

    /// Feed back the outcome of an attempt made with `modulation`.
    ///
    /// `pdr` is the ground truth of the current window. Only the oracle
    /// looks at it.
    fn update(&mut self, modulation: Modulation, status: TxStatus, pdr: &ModulationMap<f64>);
}

/// Name of a strategy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    EpsilonGreedy,
    Boltzmann,
    DiscountedUcb,
    ThreeM,
    Random,
    Best,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::EpsilonGreedy,
        StrategyKind::Boltzmann,
        StrategyKind::DiscountedUcb,
        StrategyKind::ThreeM,
        StrategyKind::Random,
        StrategyKind::Best,
    ];

    /// Short name used for output headers and log directories.
    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::EpsilonGreedy => "EG",
            StrategyKind::Boltzmann => "BE",
            StrategyKind::DiscountedUcb => "D-UCB",
            StrategyKind::ThreeM => "3M",
            StrategyKind::Random => "rand",
            StrategyKind::Best => "best",
        }
    }

    /// Configuration with default hyperparameters.
    pub fn default_config(self) -> StrategyConfig {
        match self {
            StrategyKind::EpsilonGreedy => StrategyConfig::EpsilonGreedy(Default::default()),
            StrategyKind::Boltzmann => StrategyConfig::Boltzmann(Default::default()),
            StrategyKind::DiscountedUcb => StrategyConfig::DiscountedUcb(Default::default()),
            StrategyKind::ThreeM => StrategyConfig::ThreeM(Default::default()),
            StrategyKind::Random => StrategyConfig::Random,
            StrategyKind::Best => StrategyConfig::Best,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "eg" | "epsilon-greedy" | "egreedy" => StrategyKind::EpsilonGreedy,
            "be" | "boltzmann" | "softmax" => StrategyKind::Boltzmann,
            "d-ucb" | "ducb" | "discounted-ucb" => StrategyKind::DiscountedUcb,
            "3m" | "three-m" => StrategyKind::ThreeM,
            "rand" | "random" => StrategyKind::Random,
            "best" | "oracle" => StrategyKind::Best,
            _ => return Err(Error::Config(format!("unknown strategy: {s}"))),
        };
        Ok(kind)
    }
}

/// Strategy kind plus its hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrategyConfig {
    EpsilonGreedy(EpsilonGreedyParams),
    Boltzmann(BoltzmannParams),
    DiscountedUcb(DiscountedUcbParams),
    ThreeM(ThreeMParams),
    Random,
    Best,
}

impl StrategyConfig {
    pub fn kind(&self) -> StrategyKind {
        match self {
            StrategyConfig::EpsilonGreedy(_) => StrategyKind::EpsilonGreedy,
            StrategyConfig::Boltzmann(_) => StrategyKind::Boltzmann,
            StrategyConfig::DiscountedUcb(_) => StrategyKind::DiscountedUcb,
            StrategyConfig::ThreeM(_) => StrategyKind::ThreeM,
            StrategyConfig::Random => StrategyKind::Random,
            StrategyConfig::Best => StrategyKind::Best,
        }
    }

    /// Fresh strategy state for one run.
    pub fn build(&self) -> Strategy {
        match *self {
            StrategyConfig::EpsilonGreedy(p) => Strategy::EpsilonGreedy(EpsilonGreedy::new(p)),
            StrategyConfig::Boltzmann(p) => Strategy::Boltzmann(Boltzmann::new(p)),
            StrategyConfig::DiscountedUcb(p) => Strategy::DiscountedUcb(DiscountedUcb::new(p)),
            StrategyConfig::ThreeM(p) => Strategy::ThreeM(ThreeM::new(p)),
            StrategyConfig::Random => Strategy::Random(RandomChoice),
            StrategyConfig::Best => Strategy::Best(Oracle::new()),
        }
    }
}

/// Active strategy of a run.
#[derive(Debug, Clone)]
pub enum Strategy {
    EpsilonGreedy(EpsilonGreedy),
    Boltzmann(Boltzmann),
    DiscountedUcb(DiscountedUcb),
    ThreeM(ThreeM),
    Random(RandomChoice),
    Best(Oracle),
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::EpsilonGreedy(_) => StrategyKind::EpsilonGreedy,
            Strategy::Boltzmann(_) => StrategyKind::Boltzmann,
            Strategy::DiscountedUcb(_) => StrategyKind::DiscountedUcb,
            Strategy::ThreeM(_) => StrategyKind::ThreeM,
            Strategy::Random(_) => StrategyKind::Random,
            Strategy::Best(_) => StrategyKind::Best,
        }
    }
}

impl SelectionPolicy for Strategy {
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation {
        match self {
            Strategy::EpsilonGreedy(s) => s.select(rng),
            Strategy::Boltzmann(s) => s.select(rng),
            Strategy::DiscountedUcb(s) => s.select(rng),
            Strategy::ThreeM(s) => s.select(rng),
            Strategy::Random(s) => s.select(rng),
            Strategy::Best(s) => s.select(rng),
        }
    }

    fn update(&mut self, modulation: Modulation, status: TxStatus, pdr: &ModulationMap<f64>) {
        match self {
            Strategy::EpsilonGreedy(s) => s.update(modulation, status, pdr),
            Strategy::Boltzmann(s) => s.update(modulation, status, pdr),
            Strategy::DiscountedUcb(s) => s.update(modulation, status, pdr),
            Strategy::ThreeM(s) => s.update(modulation, status, pdr),
            Strategy::Random(s) => s.update(modulation, status, pdr),
            Strategy::Best(s) => s.update(modulation, status, pdr),
        }
    }
}

/// Uniform pick over all modulations.
fn uniform_modulation<G: Rng + ?Sized>(rng: &mut G) -> Modulation {
    Modulation::ALL[rng.gen_range(0..Modulation::COUNT)]
}

/// Sample a candidate with probability proportional to its weight.
///
/// Weights that overflow, are NaN, or are all zero cannot be sampled; the
/// caller's greedy choice on the same weights is used instead.
fn sample_weighted<G: Rng + ?Sized>(candidates: &[(Modulation, f64)], rng: &mut G) -> Modulation {
    let total: f64 = candidates.iter().map(|(_, w)| w).sum();
    if total.is_finite() && total > 0.0 {
        if let Ok(dist) = WeightedIndex::new(candidates.iter().map(|(_, w)| *w)) {
            return candidates[dist.sample(rng)].0;
        }
    }
    argmax_of(candidates.iter().copied()).unwrap_or(Modulation::Fsk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_kind_names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(kind.default_config().kind(), kind);
            assert_eq!(kind.default_config().build().kind(), kind);
        }
        assert_eq!("Boltzmann".parse::<StrategyKind>().unwrap(), StrategyKind::Boltzmann);
        assert!("thompson".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_sample_weighted_respects_zero_weight() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let candidates = [(Modulation::Fsk, 0.0), (Modulation::Ofdm, 2.0)];
        for _ in 0..100 {
            assert_eq!(sample_weighted(&candidates, &mut rng), Modulation::Ofdm);
        }
    }

    #[test]
    fn test_sample_weighted_degenerate_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let overflow = [(Modulation::Fsk, 1.0), (Modulation::Oqpsk, f64::INFINITY)];
        assert_eq!(sample_weighted(&overflow, &mut rng), Modulation::Oqpsk);

        let nan = [(Modulation::Oqpsk, f64::NAN), (Modulation::Ofdm, f64::NAN)];
        assert_eq!(sample_weighted(&nan, &mut rng), Modulation::Oqpsk);

        let zero = [(Modulation::Oqpsk, 0.0), (Modulation::Ofdm, 0.0)];
        assert_eq!(sample_weighted(&zero, &mut rng), Modulation::Oqpsk);
    }

    #[test]
    fn test_uniform_covers_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut seen = ModulationMap::splat(0u32);
        for _ in 0..300 {
            seen[uniform_modulation(&mut rng)] += 1;
        }
        assert!(seen.values().iter().all(|&n| n > 50));
    }
}
