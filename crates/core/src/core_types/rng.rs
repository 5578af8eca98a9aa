//! Reproducible random-number streams
//!
//! Every worker slot of the parallel engine that owns work holds exactly one
//! [`RandomStream`] for the whole run. Streams are seeded from `base_seed + slot`, so a run is
//! reproducible for a fixed `(seed, worker_count)` pair and changes when the
//! worker count changes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)` consumed by the transition rule
///
/// Implemented by [`RandomStream`]; tests substitute scripted sources to check
/// exactly how many draws a transition consumes.
pub trait RandomSource {
    /// Next uniform sample in `[0, 1)`
    fn next_unit(&mut self) -> f64;
}

/// Seedable pseudo-random generator owned by one worker slot
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: StdRng,
    seed: u64,
}

impl RandomStream {
    /// Create a stream from a 64-bit seed
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this stream was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Underlying generator, for `rand` APIs that take an `Rng`
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl RandomSource for RandomStream {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Random streams of the worker slots that own work
///
/// Only slots that own at least one non-empty block ever draw, so only those
/// get a stream. Slots are kept in ascending order.
#[derive(Debug, Clone)]
pub struct StreamPool {
    slots: Vec<usize>,
    streams: Vec<RandomStream>,
}

impl StreamPool {
    /// Create one stream per slot; slot `i` is seeded with `base_seed + i`
    ///
    /// `slots` is sorted and deduplicated first.
    #[must_use]
    pub fn for_slots(base_seed: u64, slots: &[usize]) -> Self {
        let mut slots = slots.to_vec();
        slots.sort_unstable();
        slots.dedup();
        let streams = slots
            .iter()
            .map(|&slot| RandomStream::from_seed(base_seed.wrapping_add(slot as u64)))
            .collect();
        Self { slots, streams }
    }

    /// Number of streams held
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// True when the pool has no streams
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Slot ids in ascending order, aligned with [`Self::as_mut_slice`]
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// All streams in slot order
    pub fn as_mut_slice(&mut self) -> &mut [RandomStream] {
        &mut self.streams
    }
}
