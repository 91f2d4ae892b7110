//! Deterministic per-unit seeds.
//!
//! Each random draw is made from a generator seeded by
//! [`derive_seed`]`(global, unit, replicate)`, so results do not depend on
//! which thread evaluates which unit or in what order. A "unit" is a trial
//! index for probability evaluation and a restart index for restarts.
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Stream tag separating restart perturbations from trial replicates.
pub const RESTART_STREAM: u64 = 0x5245_5354_4152_5453;

/// Stream tag for synthetic choice simulation.
pub const SIMULATION_STREAM: u64 = 0x5349_4d55_4c41_5445;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for replicate `replicate` of unit `unit` under `global`.
///
/// Each component is folded in with its own SplitMix64 step, so
/// `(g, u, r)` and `(g, r, u)` give unrelated seeds.
pub fn derive_seed(global: u64, unit: u64, replicate: u64) -> u64 {
    let mut h = mix64(global.wrapping_add(GOLDEN_GAMMA));
    h = mix64(h ^ unit.wrapping_add(GOLDEN_GAMMA.wrapping_mul(2)));
    mix64(h ^ replicate.wrapping_add(GOLDEN_GAMMA.wrapping_mul(3)))
}

/// Generator for one unit/replicate.
pub fn rng_for(global: u64, unit: u64, replicate: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(global, unit, replicate))
}
