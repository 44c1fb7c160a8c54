//! Board-layout primitives for a laid-out coil.
//!
//! Each layer becomes an ordered run of line primitives on a copper layer,
//! optionally with every corner replaced by a quarter arc. Writing the
//! primitives to a board-script format is left to the caller.

use crate::coil::Coil;
use crate::errors::GeometryError;
use crate::math::{Scalar, R2};

/// Copper layer number of the top side.
pub const TOP_COPPER_LAYER: u8 = 1;
/// Copper layer number of the bottom side.
pub const BOTTOM_COPPER_LAYER: u8 = 16;

/// Corners whose turn is smaller than this are passed straight through.
const STRAIGHT_TOLERANCE: Scalar = 1.0e-12;

/// Copper layer number for stack-up layer `index` out of `count`.
///
/// The first layer is the top copper, the last the bottom copper and inner
/// layers are numbered from 2 upwards.
#[must_use]
pub fn copper_layer(index: usize, count: usize) -> u8 {
    if index == 0 {
        TOP_COPPER_LAYER
    } else if index + 1 == count {
        BOTTOM_COPPER_LAYER
    } else {
        u8::try_from(index + 1).unwrap_or(BOTTOM_COPPER_LAYER - 1)
    }
}

/// How the coil is exported.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Net name attached to every primitive.
    pub net: String,
    /// Radius of the arcs replacing corners (mm); sharp corners when `None`.
    pub corner_radius: Option<Scalar>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            net: "ANT".to_owned(),
            corner_radius: None,
        }
    }
}

/// One drawn piece of copper.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Straight trace.
    Line {
        /// Start point (mm).
        start: R2,
        /// End point (mm).
        end: R2,
        /// Trace width (mm).
        width: Scalar,
        /// Net name.
        net: String,
        /// Copper layer number.
        layer: u8,
    },
    /// Circular arc trace.
    Arc {
        /// Start point (mm).
        start: R2,
        /// End point (mm).
        end: R2,
        /// Arc centre (mm).
        center: R2,
        /// Trace width (mm).
        width: Scalar,
        /// Sweep sense with y pointing up.
        clockwise: bool,
        /// Net name.
        net: String,
        /// Copper layer number.
        layer: u8,
    },
}

impl Primitive {
    /// Copper layer the primitive is drawn on.
    #[must_use]
    pub const fn layer(&self) -> u8 {
        match self {
            Self::Line { layer, .. } | Self::Arc { layer, .. } => *layer,
        }
    }

    /// Start point (mm).
    #[must_use]
    pub const fn start(&self) -> &R2 {
        match self {
            Self::Line { start, .. } | Self::Arc { start, .. } => start,
        }
    }

    /// End point (mm).
    #[must_use]
    pub const fn end(&self) -> &R2 {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } => end,
        }
    }

    /// Length along the trace centre line (mm).
    #[must_use]
    pub fn length(&self) -> Scalar {
        match self {
            Self::Line { start, end, .. } => (end - start).norm(),
            Self::Arc {
                start, end, center, ..
            } => {
                let (a, b) = (start - center, end - center);
                a.norm() * a.perp(&b).atan2(a.dot(&b)).abs()
            }
        }
    }
}

/// Exports every layer of `coil` as ordered primitives, top layer first.
pub fn export(coil: &Coil, options: &LayoutOptions) -> Result<Vec<Primitive>, GeometryError> {
    let count = coil.layer_count();
    let width = coil.trace_width();
    let mut primitives = Vec::new();
    for (index, layer) in coil.layers().enumerate() {
        let Some(first) = layer.first() else {
            continue;
        };
        let points: Vec<R2> = std::iter::once(first.start())
            .chain(layer.iter().map(|segment| segment.end()))
            .map(|p| R2::new(p.x, p.y))
            .collect();
        let run = Run {
            width,
            net: &options.net,
            layer: copper_layer(index, count),
        };
        match options.corner_radius {
            Some(radius) => run.rounded(&points, radius, &mut primitives)?,
            None => run.sharp(&points, &mut primitives),
        }
    }
    Ok(primitives)
}

struct Run<'a> {
    width: Scalar,
    net: &'a str,
    layer: u8,
}

impl Run<'_> {
    fn line(&self, start: R2, end: R2) -> Primitive {
        Primitive::Line {
            start,
            end,
            width: self.width,
            net: self.net.to_owned(),
            layer: self.layer,
        }
    }

    fn sharp(&self, points: &[R2], out: &mut Vec<Primitive>) {
        out.extend(points.windows(2).map(|pair| self.line(pair[0], pair[1])));
    }

    fn rounded(
        &self,
        points: &[R2],
        radius: Scalar,
        out: &mut Vec<Primitive>,
    ) -> Result<(), GeometryError> {
        let radius = GeometryError::require_positive("corner radius", radius)?;
        let Some(&origin) = points.first() else {
            return Ok(());
        };
        let mut cursor = origin;
        for window in points.windows(3) {
            let (prev, corner, next) = (window[0], window[1], window[2]);
            let (incoming, outgoing) = (corner - prev, next - corner);
            let limit = incoming.norm().min(outgoing.norm()) / 2.0;
            if radius > limit {
                return Err(GeometryError::CornerRadius { radius, limit });
            }
            let (u, v) = (incoming.normalize(), outgoing.normalize());
            let turn = u.perp(&v);
            if turn.abs() < STRAIGHT_TOLERANCE {
                continue;
            }
            let arc_start = corner - u * radius;
            let arc_end = corner + v * radius;
            if (arc_start - cursor).norm() > STRAIGHT_TOLERANCE {
                out.push(self.line(cursor, arc_start));
            }
            out.push(Primitive::Arc {
                start: arc_start,
                end: arc_end,
                center: arc_start + v * radius,
                width: self.width,
                clockwise: turn < 0.0,
                net: self.net.to_owned(),
                layer: self.layer,
            });
            cursor = arc_end;
        }
        if let Some(&last) = points.last() {
            out.push(self.line(cursor, last));
        }
        Ok(())
    }
}
