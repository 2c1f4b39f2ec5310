//! Deterministic partitioning of one run seed into independent random streams
//!
//! Every FOV and every marker pair gets its own generator derived from the
//! run seed, so results do not depend on how work is scheduled across threads.

use rand::SeedableRng;
use rand::rngs::StdRng;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// `SplitMix64` finalizer
pub const fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for one FOV, derived from the run seed and the FOV identifier
pub fn fov_seed(run_seed: u64, fov_id: &str) -> u64 {
    fov_id
        .bytes()
        .fold(splitmix64(run_seed), |acc, byte| {
            splitmix64(acc ^ u64::from(byte))
        })
}

/// Seed for the unordered marker pair (j, k) within a FOV
pub const fn pair_seed(seed: u64, j: usize, k: usize) -> u64 {
    let (lo, hi) = if j <= k { (j, k) } else { (k, j) };
    splitmix64(splitmix64(seed ^ (lo as u64).wrapping_mul(GOLDEN_GAMMA)) ^ hi as u64)
}

/// Generator for the unordered marker pair (j, k)
pub fn pair_rng(seed: u64, j: usize, k: usize) -> StdRng {
    StdRng::seed_from_u64(pair_seed(seed, j, k))
}
