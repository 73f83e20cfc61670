//! modsim-core: trace-driven evaluation of modulation-selection strategies
//!
//! This library replays recorded channel-quality traces for a wireless
//! sensor and simulates packet/ACK delivery under a shared retry budget,
//! so that online modulation-selection strategies can be compared on the
//! same channel conditions.
//!
//! # Architecture
//!
//! - `modulation`: the three modulations and an enum-indexed map
//! - `channel`: trace reader and probabilistic delivery model
//! - `allocator`: retry budget shared across consecutive packets
//! - `packet`: per-packet retry state machine and run counters
//! - `strategy`: bandit and baseline selection policies
//! - `metrics`: PDR/RNP, metrics file and per-packet log
//! - `simulation`: the loop tying everything together
//!
//! # Design Principles
//!
//! - **No panics**: malformed input and I/O failures are structured errors
//! - **Deterministic**: one seeded generator per run, threaded explicitly
//! - **Exclusive state**: each run owns its channel, budget, counters and
//!   strategy, so independent runs can execute in parallel

pub mod allocator;
pub mod channel;
pub mod error;
pub mod metrics;
pub mod modulation;
pub mod packet;
pub mod simulation;
pub mod strategy;

// Re-export commonly used types
pub use error::{Error, Result};
pub use modulation::{Modulation, ModulationMap};
pub use simulation::{run_simulation, Simulation, SimulationConfig};
pub use strategy::{Strategy, StrategyConfig, StrategyKind};
