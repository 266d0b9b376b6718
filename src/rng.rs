//! Seedable randomness for randomized effects and spawn ranges

use std::cell::RefCell;

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Per-effect PCG stream
///
/// Cloning an effect is a `&self` operation that may still need fresh draws,
/// so the generator sits behind a `RefCell`.
#[derive(Debug)]
pub struct Dice(RefCell<Pcg32>);

impl Dice {
    /// Seeded from the thread RNG
    pub fn from_entropy() -> Self {
        Self(RefCell::new(Pcg32::from_rng(&mut rand::rng())))
    }

    /// Reproducible stream
    pub fn seeded(seed: u64) -> Self {
        Self(RefCell::new(Pcg32::seed_from_u64(seed)))
    }

    /// Uniform in [0, 1)
    pub fn unit(&self) -> f64 {
        self.0.borrow_mut().random::<f64>()
    }

    /// Uniform in [lower, upper); `lower` when the range is empty
    pub fn between(&self, lower: f64, upper: f64) -> f64 {
        self.unit() * (upper - lower) + lower
    }

    /// Uniform index in [0, n)
    pub fn index(&self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        self.0.borrow_mut().random_range(0..n)
    }

    /// Independent stream seeded from this one
    pub fn fork(&self) -> Self {
        Self::seeded(self.0.borrow_mut().next_u64())
    }
}

/// Reroll budget after one more clone: `None` keeps the rolled values,
/// `Some(next)` rerolls and hands `next` to the copy
pub fn spend_reroll(rerolls: Option<u32>) -> Option<Option<u32>> {
    match rerolls {
        None => Some(None),
        Some(0) => None,
        Some(k) => Some(Some(k - 1)),
    }
}
