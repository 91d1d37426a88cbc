//! Randomness source for generator tie-breaks.
//!
//! Generators never reach for a process-wide RNG. They take an [`Rng`], so a
//! run is reproducible from its seed:
//! - **Normal runs**: [`SynthRng::from_entropy`] draws a seed and reports it
//! - **Reproduction / tests**: [`SynthRng::new`] with a fixed seed
//!
//! Use `<R: Rng>` generic parameters, not `&dyn Rng`.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// Trait for the random choices made during query synthesis.
pub trait Rng {
    /// Generates a random `u64`.
    fn next_u64(&mut self) -> u64;

    /// Generates a random `bool` (a fair coin flip).
    #[inline]
    fn next_bool(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// Generates a random `usize` in the range `[0, max)`.
    #[inline]
    fn next_usize(&mut self, max: usize) -> usize {
        debug_assert!(max > 0, "max must be > 0");
        (self.next_u64() % max as u64) as usize
    }

    /// Picks one element uniformly, or `None` for an empty slice.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_usize(items.len()))
    }

    /// Picks two distinct indexes in `[0, len)` without replacement.
    fn pick_two(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let first = self.next_usize(len);
        let mut second = self.next_usize(len - 1);
        if second >= first {
            second += 1;
        }
        Some((first, second))
    }
}

/// Seeded small-state RNG used by the synthesis engine.
#[derive(Debug, Clone)]
pub struct SynthRng {
    inner: SmallRng,
    seed: u64,
}

impl SynthRng {
    /// Creates an RNG whose whole stream is determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates an RNG from a freshly drawn seed. Read it back with [`seed`](Self::seed).
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Returns the seed this RNG was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Rng for SynthRng {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    #[inline]
    fn next_usize(&mut self, max: usize) -> usize {
        use rand::Rng as _;
        self.inner.gen_range(0..max)
    }
}

impl<R: Rng + ?Sized> Rng for &mut R {
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }

    fn next_usize(&mut self, max: usize) -> usize {
        (**self).next_usize(max)
    }
}
