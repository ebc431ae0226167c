//! Ghost-message masking for restricted chat messages.
//!
//! The mask is cosmetic: its length is re-rolled per ghost and never derived
//! from the real content.

use std::ops::RangeInclusive;

use rand::Rng;

/// Character used to build the mask body.
pub const MASK_CHAR: char = '■';

/// Default inclusive range for the mask length.
pub const DEFAULT_MASK_RANGE: MaskRange = MaskRange { min: 6, max: 18 };

/// Inclusive length range of the ghost mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRange {
    min: usize,
    max: usize,
}

impl MaskRange {
    /// Bounds are swapped if given in reverse; a zero minimum becomes 1.
    pub fn new(min: usize, max: usize) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let min = min.max(1);
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn bounds(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }
}

impl Default for MaskRange {
    fn default() -> Self {
        DEFAULT_MASK_RANGE
    }
}

/// Build a mask body of random length within `range`.
pub fn ghost_mask<R: Rng + ?Sized>(range: MaskRange, rng: &mut R) -> String {
    let length = rng.random_range(range.bounds());
    std::iter::repeat_n(MASK_CHAR, length).collect()
}
