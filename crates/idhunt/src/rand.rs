use rand::{Rng, rng};

/// A source of uniformly distributed indices.
///
/// Candidate generation only needs "pick one of `bound` symbols", so the trait
/// is shaped around that instead of raw bytes. Tests swap in a scripted source
/// to make generated candidates deterministic.
pub trait RandSource {
    /// Returns an index in `0..bound`. `bound` is never zero.
    fn index(&mut self, bound: usize) -> usize;
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// This RNG is cryptographically secure (ChaCha-based) and automatically
/// reseeded from the operating system, so earlier candidates reveal nothing
/// about later ones.
///
/// The type does not store the RNG; it accesses the thread-local generator on
/// each call, which keeps it `Send` even though `ThreadRng` is not.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn index(&mut self, bound: usize) -> usize {
        rng().random_range(0..bound)
    }
}
