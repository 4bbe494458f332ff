//! Thread-local random source.

use rand::Rng;

use crate::domain::ports::RandomSource;

/// [`RandomSource`] backed by `rand::thread_rng`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn draws_stay_in_the_unit_interval() {
        for _ in 0..1_000 {
            let draw = ThreadRandom.next_unit();
            assert!((0.0..1.0).contains(&draw));
        }
    }

    #[rstest]
    fn picked_indices_are_in_bounds() {
        for len in 1..20 {
            assert!(ThreadRandom.pick_index(len) < len);
        }
    }
}
