// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Safety margin for gas estimates.
//!
//! Execution between estimation and submission can take a slightly different path, so an
//! estimate is bumped by a random margin of up to `max_bps` basis points.

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::utils::bump_gas;

/// 10%
pub const DEFAULT_MAX_MARGIN_BPS: u32 = 1_000;

#[derive(Debug)]
pub struct GasMargin {
    rng: Mutex<StdRng>,
}

impl GasMargin {
    /// Margin drawn from a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Applies a margin in `[0, max_bps]` to `estimate`.
    pub fn apply(&self, estimate: u64, max_bps: u32) -> u64 {
        let bps = self.rng.lock().gen_range(0..=max_bps);
        bump_gas(estimate, bps)
    }
}

impl Default for GasMargin {
    fn default() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds() {
        let margin = GasMargin::default();
        for _ in 0..1_000 {
            let gas = margin.apply(21_000, DEFAULT_MAX_MARGIN_BPS);
            assert!((21_000..=23_100).contains(&gas), "{gas} out of range");
        }
        assert_eq!(margin.apply(21_000, 0), 21_000);
    }

    #[test]
    fn seeded_margins_repeat() {
        let first = GasMargin::seeded(7);
        let second = GasMargin::seeded(7);
        let a: Vec<_> = (0..10).map(|_| first.apply(1_000_000, 1_000)).collect();
        let b: Vec<_> = (0..10).map(|_| second.apply(1_000_000, 1_000)).collect();
        assert_eq!(a, b);
    }
}
