//! Shared error types used across submodules.

use thiserror::Error;

use crate::math::{Scalar, R3};
use crate::peec::KernelFault;

/// Geometry that cannot be turned into a valid conductor or coil.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A length, width or thickness is zero, negative or not a number.
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveDimension {
        /// Which dimension was rejected.
        name: &'static str,
        /// The rejected value.
        value: Scalar,
    },
    /// A segment endpoint has a NaN or infinite coordinate.
    #[error("segment endpoint {0:?} is not finite")]
    NonFiniteCoordinate(R3),
    /// A segment whose endpoints coincide.
    #[error("degenerate segment: start {start:?} and end {end:?} coincide")]
    DegenerateSegment {
        /// Start point (mm).
        start: R3,
        /// End point (mm).
        end: R3,
    },
    /// A coil was requested with no turns.
    #[error("a coil needs at least one turn")]
    ZeroTurns,
    /// A coil was requested with no layers.
    #[error("a coil needs at least one layer")]
    ZeroLayers,
    /// The winding does not fit inside the coil outline.
    #[error("invalid design: winding needs {required} mm but the outline allows {available} mm")]
    InvalidDesign {
        /// `2 · (gap + trace width) · turns` in millimetres.
        required: Scalar,
        /// Shorter side of the outline in millimetres.
        available: Scalar,
    },
    /// A feature is smaller than the fabrication rules allow.
    #[error("{name} of {value} mm is below the {minimum} mm design rule")]
    BelowDesignRule {
        /// Which feature was rejected.
        name: &'static str,
        /// The rejected size (mm).
        value: Scalar,
        /// The rule it violates (mm).
        minimum: Scalar,
    },
    /// Consecutive segments of a layer do not meet end to start.
    #[error("segment {index} ends {distance} mm away from the start of segment {}", .index + 1)]
    Discontinuous {
        /// Index of the segment whose end is out of place.
        index: usize,
        /// Distance between its end and the next start (mm).
        distance: Scalar,
    },
    /// A corner radius larger than the traces it joins.
    #[error("corner radius {radius} mm exceeds the {limit} mm the adjoining traces allow")]
    CornerRadius {
        /// Requested radius (mm).
        radius: Scalar,
        /// Largest radius that fits (mm).
        limit: Scalar,
    },
}

impl GeometryError {
    /// Returns `value` if it is strictly positive and finite.
    pub(crate) fn require_positive(name: &'static str, value: Scalar) -> Result<Scalar, Self> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(Self::NonPositiveDimension { name, value })
        }
    }
}

/// Top-level error type for the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NfcCoilError {
    /// Wraps geometry validation errors.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Wraps unhandled numeric faults raised by the inductance kernel.
    #[error(transparent)]
    Kernel(#[from] KernelFault),
    /// Raised when `k` is requested for coils whose inductance product is not positive.
    #[error("coupling coefficient undefined for inductance product {value} µH²")]
    NonPhysicalInductance {
        /// `L_self · L_other` in µH².
        value: Scalar,
    },
}
