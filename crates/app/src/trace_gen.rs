//! Synthetic trace generation.
//!
//! Real traces come from measurement campaigns; for trying the tool out and
//! for tests we generate traces with recognisable channel behavior instead.
//!
//! # Design
//!
//! Generated traces mix:
//! - Stable windows (one modulation clearly best, others mediocre)
//! - Fading windows (independent random PDRs)
//! - Blackout windows (every modulation nearly dead)
//! - Oversized windows (size >= 75, skipped by the channel model)
//!
//! This makes strategy differences and the window-skipping path visible.

use modsim_core::channel::MAX_WINDOW_SIZE;
use modsim_core::Modulation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::io::Write;

/// Generate a trace with `records` lines.
///
/// # Arguments
/// - `seed`: random seed for determinism
/// - `records`: number of trace records
///
/// # Returns
/// The trace text, one tab-separated record per line.
pub fn generate_trace(seed: u64, records: usize) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut trace = String::with_capacity(records * 32);

    for index in 0..records {
        let window_type: u8 = rng.gen_range(0..10);

        let (size, pdr) = match window_type {
            // 40% stable with a dominant modulation
            0..=3 => {
                let best = rng.gen_range(0..Modulation::COUNT);
                let mut pdr = [0.0; Modulation::COUNT];
                for (i, p) in pdr.iter_mut().enumerate() {
                    *p = if i == best {
                        rng.gen_range(0.85..=1.0)
                    } else {
                        rng.gen_range(0.2..0.7)
                    };
                }
                (rng.gen_range(10..MAX_WINDOW_SIZE), pdr)
            }

            // 30% fading
            4..=6 => {
                let pdr = [rng.gen(), rng.gen(), rng.gen()];
                (rng.gen_range(1..40), pdr)
            }

            // 10% blackout
            7 => {
                let pdr = [rng.gen_range(0.0..0.05), rng.gen_range(0.0..0.05), 0.0];
                (rng.gen_range(1..20), pdr)
            }

            // 20% oversized sampling windows
            _ => {
                let pdr = [rng.gen(), rng.gen(), rng.gen()];
                (rng.gen_range(MAX_WINDOW_SIZE..=2 * MAX_WINDOW_SIZE), pdr)
            }
        };

        // writing into a String cannot fail
        let _ = writeln!(
            trace,
            "{index}\t{size}\t{:.4}\t{:.4}\t{:.4}",
            pdr[0], pdr[1], pdr[2]
        );
    }

    trace
}

/// Write a generated trace to a file.
pub fn write_trace_file(path: &std::path::Path, seed: u64, records: usize) -> std::io::Result<()> {
    let trace = generate_trace(seed, records);
    let mut file = std::fs::File::create(path)?;
    file.write_all(trace.as_bytes())?;
    Ok(())
}
