//! Port for randomness so selection logic can be driven deterministically.

/// Source of uniformly distributed numbers.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// A value in `[0, 1)`.
    fn next_unit(&self) -> f64;

    /// An index in `0..len`; `len` must be non-zero.
    fn pick_index(&self, len: usize) -> usize {
        let scaled = (self.next_unit() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }
}
