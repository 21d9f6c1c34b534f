//! Shared helpers for VQueue benchmarks.

use rand::{distributions::Alphanumeric, Rng, SeedableRng};

/// Generates `count` payloads of `len` bytes from a fixed seed, so runs
/// are comparable.
#[must_use]
pub fn payloads(count: usize, len: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| (&mut rng).sample_iter(&Alphanumeric).take(len).collect())
        .collect()
}
