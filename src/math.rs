//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::{Vector2, Vector3};

use crate::constants::MM_PER_CM;

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Three-dimensional real vector used for points and offsets (millimetres).
pub type R3 = Vector3<Scalar>;
/// Planar point on a copper layer (millimetres).
pub type R2 = Vector2<Scalar>;

/// Converts a length in millimetres to centimetres.
#[inline]
#[must_use]
pub fn mm_to_cm(mm: Scalar) -> Scalar {
    mm / MM_PER_CM
}

/// Neumaier-compensated running sum.
///
/// The inclusion–exclusion sums in the mutual-inductance kernel add terms of
/// comparable magnitude and alternating sign; plain accumulation loses digits
/// that the final `1 / (a·b·c·d)` scaling then amplifies.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: Scalar,
    compensation: Scalar,
}

impl CompensatedSum {
    /// Creates an empty sum.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sum: 0.0,
            compensation: 0.0,
        }
    }

    /// Adds `value` to the running total.
    pub fn add(&mut self, value: Scalar) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Returns the compensated total.
    #[must_use]
    pub fn total(&self) -> Scalar {
        self.sum + self.compensation
    }
}

impl Extend<Scalar> for CompensatedSum {
    fn extend<T: IntoIterator<Item = Scalar>>(&mut self, iter: T) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<Scalar> for CompensatedSum {
    fn from_iter<T: IntoIterator<Item = Scalar>>(iter: T) -> Self {
        let mut sum = Self::new();
        sum.extend(iter);
        sum
    }
}
