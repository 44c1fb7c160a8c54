//! Segment layout of a single spiral layer.

use crate::errors::GeometryError;
use crate::materials::ConductorMaterial;
use crate::math::{Scalar, R3};
use crate::peec::Segment;

use super::CoilDesign;

/// Largest end-to-start distance (mm) tolerated between consecutive segments.
pub(crate) const CONTINUITY_TOLERANCE: Scalar = 1.0e-9;

/// Winding sense of one layer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindingDirection {
    /// Starts at the origin along +x and turns towards +y.
    Clockwise,
    /// Mirror image of [`WindingDirection::Clockwise`] about the vertical centre line.
    CounterClockwise,
}

impl WindingDirection {
    /// Even layers wind clockwise, odd layers counter-clockwise.
    #[must_use]
    pub const fn for_layer(layer: usize) -> Self {
        if layer % 2 == 0 {
            Self::Clockwise
        } else {
            Self::CounterClockwise
        }
    }
}

/// Corner points of the inward spiral in the xy-plane, outermost first.
///
/// Turn `t` contributes four corners inset by `t · pitch`; the last corner of
/// each turn is where the next turn starts.
fn corners(design: &CoilDesign, direction: WindingDirection) -> Vec<(Scalar, Scalar)> {
    let (w, l, p) = (design.width(), design.length(), design.pitch());
    let mut points = Vec::with_capacity(4 * design.turns() as usize + 1);
    points.push((0.0, 0.0));
    for turn in 0..design.turns() {
        let inset = Scalar::from(turn) * p;
        let next = inset + p;
        points.push((w - inset, inset));
        points.push((w - inset, l - inset));
        points.push((next, l - inset));
        points.push((next, next));
    }
    if direction == WindingDirection::CounterClockwise {
        for point in &mut points {
            point.0 = w - point.0;
        }
    }
    points
}

/// Lays out one layer at height `z` (mm): four segments per turn, alternating
/// between the x and y axes, each starting where the previous one ended.
pub(crate) fn wind_layer(
    design: &CoilDesign,
    z: Scalar,
    direction: WindingDirection,
    material: &ConductorMaterial,
) -> Result<Vec<Segment>, GeometryError> {
    corners(design, direction)
        .windows(2)
        .map(|pair| {
            let start = R3::new(pair[0].0, pair[0].1, z);
            let end = R3::new(pair[1].0, pair[1].1, z);
            Segment::new(start, end, design.trace_width(), material)
        })
        .collect()
}

/// Verifies that every segment ends where the next one starts.
pub(crate) fn check_continuity(segments: &[Segment]) -> Result<(), GeometryError> {
    for (index, pair) in segments.windows(2).enumerate() {
        let distance = (pair[1].start() - pair[0].end()).norm();
        if distance > CONTINUITY_TOLERANCE {
            return Err(GeometryError::Discontinuous { index, distance });
        }
    }
    Ok(())
}
