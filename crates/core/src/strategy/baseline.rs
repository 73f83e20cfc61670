//! Reference points for the learning strategies: pure chance and an oracle.

use super::{uniform_modulation, SelectionPolicy};
use crate::channel::TxStatus;
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;

/// Picks a modulation uniformly at random and never learns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomChoice;

impl SelectionPolicy for RandomChoice {
    fn select<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Modulation {
        uniform_modulation(rng)
    }

    fn update(&mut self, _modulation: Modulation, _status: TxStatus, _pdr: &ModulationMap<f64>) {}
}

/// Upper-bound baseline that reads the channel's true PDR.
///
/// The PDR it sees is the one reported with the previous attempt, so the
/// first attempt after a window change still follows the old window.
#[derive(Debug, Clone)]
pub struct Oracle {
    pdr: ModulationMap<f64>,
}

impl Oracle {
    /// Start from an uninformative prior.
    pub fn new() -> Self {
        Self {
            pdr: ModulationMap::splat(1.0 / 3.0),
        }
    }
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionPolicy for Oracle {
    fn select<G: Rng + ?Sized>(&mut self, _rng: &mut G) -> Modulation {
        self.pdr.argmax()
    }

    fn update(&mut self, _modulation: Modulation, _status: TxStatus, pdr: &ModulationMap<f64>) {
        self.pdr = *pdr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_oracle_tracks_ground_truth() {
        let mut oracle = Oracle::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(oracle.select(&mut rng), Modulation::Fsk);

        let status = TxStatus::default();
        oracle.update(Modulation::Fsk, status, &ModulationMap::new([0.2, 0.3, 0.9]));
        assert_eq!(oracle.select(&mut rng), Modulation::Ofdm);

        oracle.update(Modulation::Ofdm, status, &ModulationMap::new([0.7, 0.7, 0.1]));
        assert_eq!(oracle.select(&mut rng), Modulation::Fsk);
    }

    #[test]
    fn test_random_is_seeded() {
        let mut a = RandomChoice;
        let mut b = RandomChoice;
        let mut rng_a = ChaCha8Rng::seed_from_u64(77);
        let mut rng_b = ChaCha8Rng::seed_from_u64(77);

        let picks_a: Vec<_> = (0..50).map(|_| a.select(&mut rng_a)).collect();
        let picks_b: Vec<_> = (0..50).map(|_| b.select(&mut rng_b)).collect();
        assert_eq!(picks_a, picks_b);
    }
}
