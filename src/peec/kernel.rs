//! Closed-form mutual inductance between parallel rectangular bars.
//!
//! Implements the Hoer–Love expression (J. Res. NBS 69C, 1965): the partial
//! mutual inductance of two bars with parallel length axes is the alternating
//! sum of a primitive `Mb(x, y, z)` over the 4 × 4 × 4 combinations of corner
//! separations along the width, length and thickness directions, scaled by
//! `0.001 / (a·b·c·d)`. All lengths are in centimetres, the result in µH.

use thiserror::Error;
use tracing::{trace, warn};

use crate::math::{mm_to_cm, CompensatedSum, Scalar, R3};

use super::segment::Segment;

/// Kernel evaluation produced a non-finite value outside the known degenerate cases.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("mutual-inductance kernel is not finite at (x, y, z) = ({x}, {y}, {z}) cm")]
pub struct KernelFault {
    /// Width-direction separation (cm).
    pub x: Scalar,
    /// Length-direction separation (cm).
    pub y: Scalar,
    /// Thickness-direction separation (cm).
    pub z: Scalar,
}

/// Hoer–Love primitive `Mb(x, y, z)`.
///
/// When two of the three separations vanish one of the logarithms has a zero
/// denominator; every log and arctangent term is zero in that limit and only
/// the `d · (x⁴ + y⁴ + z⁴ − 3x²y² − 3y²z² − 3z²x²) / 60` term survives.
pub fn rectangular_primitive(x: Scalar, y: Scalar, z: Scalar) -> Result<Scalar, KernelFault> {
    let (x2, y2, z2) = (x * x, y * y, z * z);
    let (x4, y4, z4) = (x2 * x2, y2 * y2, z2 * z2);
    let d = (x2 + y2 + z2).sqrt();

    let radial = (x4 + y4 + z4 - 3.0 * x2 * y2 - 3.0 * y2 * z2 - 3.0 * z2 * x2) * d / 60.0;

    let log_x = ((x + d) / (y2 + z2).sqrt()).ln();
    let log_y = ((y + d) / (x2 + z2).sqrt()).ln();
    let log_z = ((z + d) / (x2 + y2).sqrt()).ln();

    if !(log_x.is_finite() && log_y.is_finite() && log_z.is_finite()) {
        trace!(x, y, z, "kernel degeneracy, keeping radial term only");
        return finite(radial, x, y, z);
    }

    let poly_x = x * (y2 * z2 / 4.0 - y4 / 24.0 - z4 / 24.0);
    let poly_y = y * (x2 * z2 / 4.0 - x4 / 24.0 - z4 / 24.0);
    let poly_z = z * (x2 * y2 / 4.0 - x4 / 24.0 - y4 / 24.0);

    let atan_z = x * y * z2 * z / 6.0 * (x * y / (z * d)).atan();
    let atan_y = x * z * y2 * y / 6.0 * (x * z / (y * d)).atan();
    let atan_x = z * y * x2 * x / 6.0 * (y * z / (x * d)).atan();

    let value =
        poly_x * log_x + poly_y * log_y + poly_z * log_z + radial - atan_z - atan_y - atan_x;
    finite(value, x, y, z)
}

fn finite(value: Scalar, x: Scalar, y: Scalar, z: Scalar) -> Result<Scalar, KernelFault> {
    if value.is_finite() {
        Ok(value)
    } else {
        warn!(x, y, z, value, "unhandled mutual-inductance degeneracy");
        Err(KernelFault { x, y, z })
    }
}

/// Mean separation of two segments along component `axis`, in centimetres.
fn separation(this: &Segment, other: &Segment, offset: &R3, axis: usize) -> Scalar {
    let start = this.start()[axis] - (other.start()[axis] + offset[axis]);
    let end = this.end()[axis] - (other.end()[axis] + offset[axis]);
    mm_to_cm(start + end) / 2.0
}

/// Mutual inductance (µH) between `this` and `other` translated by `offset` (mm).
///
/// The orientation is read from `this` alone: its dominant axis decides which
/// coordinate is the along-length separation `E` and which the in-plane
/// perpendicular `l₃`; `P` is the vertical separation. The caller is
/// responsible for only pairing parallel segments.
pub fn mutual_inductance(this: &Segment, other: &Segment, offset: &R3) -> Result<Scalar, KernelFault> {
    let axis = this.axis();
    let e = separation(this, other, offset, axis.along());
    let l3 = separation(this, other, offset, axis.across());
    let p = separation(this, other, offset, 2);

    let (a, d) = (this.width_cm(), other.width_cm());
    let (l1, l2) = (this.length_cm(), other.length_cm());
    let (b, c) = (this.thickness_cm(), other.thickness_cm());

    let xs = [e - a, e + d - a, e + d, e];
    let ys = [l3 - l1, l3 + l2 - l1, l3 + l2, l3];
    let zs = [p - b, p + c - b, p + c, p];

    let mut sum = CompensatedSum::new();
    for (i, &x) in xs.iter().enumerate() {
        for (j, &y) in ys.iter().enumerate() {
            for (k, &z) in zs.iter().enumerate() {
                let term = rectangular_primitive(x, y, z)?;
                if (i + j + k) % 2 == 0 {
                    sum.add(term);
                } else {
                    sum.add(-term);
                }
            }
        }
    }

    Ok(sum.total() * 0.001 / (a * b * c * d))
}
