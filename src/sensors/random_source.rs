use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of randomness for timing draws and sensor sampling.
///
/// Every actor owns one, so tests can swap in a deterministic sequence.
pub trait RandomSource: Send {
    /// Uniform integer in `[low, high]`, both bounds inclusive.
    fn uniform_int(&mut self, low: u32, high: u32) -> u32;

    /// `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool;
}

// random_bool panics outside [0, 1]; NaN counts as 0.
fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

/// Draws from the thread-local generator on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        rand::rng().random_range(low..=high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        rand::rng().random_bool(clamp_probability(probability))
    }
}

/// Reproducible generator, used when the configuration carries a seed.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random_bool(clamp_probability(probability))
    }
}

/// Replays fixed outcomes in order.
///
/// Integer draws are clamped into the requested range. Once a queue runs dry
/// integer draws return the lower bound and flips return `fallback_flip`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    ints: VecDeque<u32>,
    flips: VecDeque<bool>,
    fallback_flip: bool,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every flip comes out as `outcome`.
    pub fn always(outcome: bool) -> Self {
        Self {
            fallback_flip: outcome,
            ..Self::default()
        }
    }

    pub fn with_ints(mut self, ints: impl IntoIterator<Item = u32>) -> Self {
        self.ints.extend(ints);
        self
    }

    pub fn with_flips(mut self, flips: impl IntoIterator<Item = bool>) -> Self {
        self.flips.extend(flips);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_int(&mut self, low: u32, high: u32) -> u32 {
        match self.ints.pop_front() {
            Some(value) => value.clamp(low, high.max(low)),
            None => low,
        }
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.flips.pop_front().unwrap_or(self.fallback_flip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_bounds() {
        let mut rng = ThreadRandom;
        for _ in 0..500 {
            let value = rng.uniform_int(5, 10);
            assert!((5..=10).contains(&value));
        }
        assert_eq!(rng.uniform_int(7, 7), 7);
    }

    #[test]
    fn seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let draws_a: Vec<u32> = (0..20).map(|_| a.uniform_int(0, 100)).collect();
        let draws_b: Vec<u32> = (0..20).map(|_| b.uniform_int(0, 100)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn chance_extremes_are_certain() {
        let mut rng = SeededRandom::new(7);
        assert!((0..100).all(|_| rng.chance(1.0)));
        assert!((0..100).all(|_| !rng.chance(0.0)));
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        let mut seeded = SeededRandom::new(7);
        let mut thread = ThreadRandom;
        assert!(!seeded.chance(f64::NAN));
        assert!(!thread.chance(f64::NAN));
        assert!(seeded.chance(3.0));
        assert!(!thread.chance(-1.0));
    }

    #[test]
    fn scripted_random_replays_then_falls_back() {
        let mut rng = ScriptedRandom::always(true)
            .with_ints([8, 50])
            .with_flips([false]);
        assert_eq!(rng.uniform_int(5, 10), 8);
        // out-of-range values are clamped
        assert_eq!(rng.uniform_int(5, 10), 10);
        assert_eq!(rng.uniform_int(5, 10), 5);
        assert!(!rng.chance(0.5));
        assert!(rng.chance(0.5));
    }
}
