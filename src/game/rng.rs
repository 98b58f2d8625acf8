use std::sync::Mutex;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// Source of randomness for turn order and word selection.
///
/// Kept behind a trait so tests can pin outcomes.
pub trait RandomSource: Send + Sync {
    /// Uniform random permutation of `0..len`
    fn permutation(&self, len: usize) -> Vec<usize>;

    /// Uniform index in `0..len`; `len` must be non-zero
    fn index(&self, len: usize) -> usize;
}

/// `StdRng` behind a mutex
pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    pub fn from_os() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A panic while holding the lock cannot leave StdRng half-updated
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomSource for StdRandom {
    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        self.with_rng(|rng| order.shuffle(rng));
        order
    }

    fn index(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.random_range(0..len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_is_complete() {
        let rng = StdRandom::from_os();
        for len in 1..10 {
            let mut order = rng.permutation(len);
            order.sort_unstable();
            assert_eq!(order, (0..len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = StdRandom::seeded(42);
        let b = StdRandom::seeded(42);
        assert_eq!(a.permutation(8), b.permutation(8));
        assert_eq!(a.index(100), b.index(100));
    }

    #[test]
    fn test_index_in_range() {
        let rng = StdRandom::seeded(1);
        for _ in 0..200 {
            assert!(rng.index(3) < 3);
        }
    }

    #[test]
    fn test_shuffle_reaches_every_first_position() {
        let rng = StdRandom::seeded(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.permutation(4)[0]] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
