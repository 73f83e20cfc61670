//! Discounted upper confidence bound.
//!
//! Both the pull counts `N` and the reward sums `Q` decay by `gamma` after
//! every attempt, so old observations fade and the policy can track a
//! drifting channel. The score of an arm is
//!
//! ```text
//! Q[m] + xi * sqrt(2 * ln(ΣN) / N[m])
//! ```
//!
//! and an arm whose discounted count is exactly zero is always tried first.

use super::SelectionPolicy;
use crate::channel::TxStatus;
use crate::modulation::{Modulation, ModulationMap};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountedUcbParams {
    /// Discount factor applied to counts and rewards
    pub gamma: f64,

    /// Weight of the confidence bonus
    pub xi: f64,

    /// Reward bound. Accepted for compatibility, not used by the rule.
    pub b: f64,
}

impl Default for DiscountedUcbParams {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            xi: 1.0,
            b: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscountedUcb {
    params: DiscountedUcbParams,
    q: ModulationMap<f64>,
    n: ModulationMap<f64>,
}

impl DiscountedUcb {
    pub fn new(params: DiscountedUcbParams) -> Self {
        Self {
            params,
            q: ModulationMap::splat(1.0),
            n: ModulationMap::splat(1.0),
        }
    }

    /// Upper confidence score of every arm.
    pub fn scores(&self) -> ModulationMap<f64> {
        let total = self.n.sum();
        self.n.map(|m, &n| {
            if n == 0.0 {
                f64::INFINITY
            } else {
                self.q[m] + self.params.xi * (2.0 * total.ln() / n).sqrt()
            }
        })
    }

    pub fn counts(&self) -> &ModulationMap<f64> {
        &self.n
    }

    pub fn rewards(&self) -> &ModulationMap<f64> {
        &self.q
    }
}

impl SelectionPolicy for DiscountedUcb {
    fn select<G: Rng + ?Sized>(&mut self, _rng: &mut G) -> Modulation {
        self.scores().argmax()
    }

    fn update(&mut self, modulation: Modulation, status: TxStatus, _pdr: &ModulationMap<f64>) {
        let gamma = self.params.gamma;
        let reward = status.reward();
        for (m, n) in self.n.iter_mut() {
            let pulled = if m == modulation { 1.0 } else { 0.0 };
            *n = gamma * *n + pulled;
            self.q[m] = gamma * self.q[m] + reward * pulled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const ACKED: TxStatus = TxStatus {
        pkt_delivered: true,
        ack_delivered: true,
    };
    const FAIL: TxStatus = TxStatus {
        pkt_delivered: true,
        ack_delivered: false,
    };

    #[test]
    fn test_discounted_update() {
        let mut ucb = DiscountedUcb::new(DiscountedUcbParams::default());
        ucb.update(Modulation::Oqpsk, ACKED, &ModulationMap::splat(0.0));

        assert!((ucb.counts()[Modulation::Fsk] - 0.9).abs() < 1e-12);
        assert!((ucb.counts()[Modulation::Oqpsk] - 1.9).abs() < 1e-12);
        assert!((ucb.rewards()[Modulation::Oqpsk] - 1.9).abs() < 1e-12);
        assert!((ucb.rewards()[Modulation::Ofdm] - 0.9).abs() < 1e-12);

        ucb.update(Modulation::Ofdm, FAIL, &ModulationMap::splat(0.0));
        assert!((ucb.counts()[Modulation::Ofdm] - 1.81).abs() < 1e-12);
        assert!((ucb.rewards()[Modulation::Ofdm] - 0.81).abs() < 1e-12);
    }

    #[test]
    fn test_zero_count_arm_wins() {
        let mut ucb = DiscountedUcb::new(DiscountedUcbParams::default());
        ucb.q = ModulationMap::new([100.0, 50.0, -5.0]);
        ucb.n = ModulationMap::new([1.0, 2.0, 0.0]);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(ucb.select(&mut rng), Modulation::Ofdm);
    }

    #[test]
    fn test_zero_discount_forgets_unpulled_arms() {
        let params = DiscountedUcbParams {
            gamma: 0.0,
            ..Default::default()
        };
        let mut ucb = DiscountedUcb::new(params);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // symmetric start, FSK wins the tie
        assert_eq!(ucb.select(&mut rng), Modulation::Fsk);
        ucb.update(Modulation::Fsk, ACKED, &ModulationMap::splat(0.0));

        // the other arms now have zero count and outrank FSK in order
        assert_eq!(ucb.select(&mut rng), Modulation::Oqpsk);
    }

    #[test]
    fn test_bonus_scales_with_xi() {
        let plain = DiscountedUcb::new(DiscountedUcbParams::default());
        let wide = DiscountedUcb::new(DiscountedUcbParams {
            xi: 2.0,
            ..Default::default()
        });

        let bonus = plain.scores()[Modulation::Fsk] - 1.0;
        let wide_bonus = wide.scores()[Modulation::Fsk] - 1.0;
        assert!((bonus - (2.0 * 3f64.ln()).sqrt()).abs() < 1e-12);
        assert!((wide_bonus - 2.0 * bonus).abs() < 1e-12);
    }
}
