//! Physical-layer modulations and per-modulation state.
//!
//! All strategy state is indexed by [`Modulation`] through [`ModulationMap`],
//! a fixed-size array with the canonical iteration order `FSK, OQPSK, OFDM`.
//! Every `argmax` in the engine walks that order and keeps the first maximal
//! element, so ties always resolve the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the three modulations a sensor can transmit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modulation {
    #[serde(rename = "FSK")]
    Fsk,
    #[serde(rename = "OQPSK")]
    Oqpsk,
    #[serde(rename = "OFDM")]
    Ofdm,
}

impl Modulation {
    /// All modulations in canonical order.
    pub const ALL: [Modulation; 3] = [Modulation::Fsk, Modulation::Oqpsk, Modulation::Ofdm];

    /// Number of modulations.
    pub const COUNT: usize = 3;

    /// Position in the canonical order.
    pub const fn index(self) -> usize {
        match self {
            Modulation::Fsk => 0,
            Modulation::Oqpsk => 1,
            Modulation::Ofdm => 2,
        }
    }

    /// Name as it appears in trace and log files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Modulation::Fsk => "FSK",
            Modulation::Oqpsk => "OQPSK",
            Modulation::Ofdm => "OFDM",
        }
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FSK" => Ok(Modulation::Fsk),
            "OQPSK" => Ok(Modulation::Oqpsk),
            "OFDM" => Ok(Modulation::Ofdm),
            _ => Err(format!("unknown modulation: {s}")),
        }
    }
}

/// A value for every modulation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModulationMap<T>([T; Modulation::COUNT]);

impl<T> ModulationMap<T> {
    /// Build a map from values given in canonical order.
    pub const fn new(values: [T; Modulation::COUNT]) -> Self {
        Self(values)
    }

    /// Build a map by evaluating `f` for each modulation.
    pub fn from_fn(mut f: impl FnMut(Modulation) -> T) -> Self {
        Self(Modulation::ALL.map(&mut f))
    }

    /// Iterate `(modulation, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Modulation, &T)> {
        Modulation::ALL.into_iter().zip(self.0.iter())
    }

    /// Mutable iteration in canonical order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Modulation, &mut T)> {
        Modulation::ALL.into_iter().zip(self.0.iter_mut())
    }

    /// Apply `f` to every value.
    pub fn map<U>(&self, mut f: impl FnMut(Modulation, &T) -> U) -> ModulationMap<U> {
        ModulationMap::from_fn(|m| f(m, &self[m]))
    }

    pub fn values(&self) -> &[T; Modulation::COUNT] {
        &self.0
    }
}

impl<T: Clone> ModulationMap<T> {
    /// Same value for every modulation.
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl ModulationMap<f64> {
    /// First modulation (in canonical order) with the largest value.
    ///
    /// NaN values never displace an earlier candidate.
    pub fn argmax(&self) -> Modulation {
        argmax_of(self.iter().map(|(m, v)| (m, *v))).unwrap_or(Modulation::Fsk)
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// First element with the strictly largest score, in iteration order.
///
/// Falls back to the first element when no score compares greater (all NaN).
pub(crate) fn argmax_of(
    scores: impl IntoIterator<Item = (Modulation, f64)>,
) -> Option<Modulation> {
    let mut best: Option<(Modulation, f64)> = None;
    for (m, score) in scores {
        match best {
            Some((_, best_score))
                if !(score > best_score || (best_score.is_nan() && !score.is_nan())) => {}
            _ => best = Some((m, score)),
        }
    }
    best.map(|(m, _)| m)
}

impl<T> Index<Modulation> for ModulationMap<T> {
    type Output = T;

    fn index(&self, m: Modulation) -> &T {
        &self.0[m.index()]
    }
}

impl<T> IndexMut<Modulation> for ModulationMap<T> {
    fn index_mut(&mut self, m: Modulation) -> &mut T {
        &mut self.0[m.index()]
    }
}
