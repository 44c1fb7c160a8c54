use crate::constants::MM_PER_CM;
use crate::errors::GeometryError;
use crate::materials::ConductorMaterial;
use crate::math::{mm_to_cm, Scalar, R3};

use super::kernel::{self, KernelFault};

/// Principal in-plane axis a segment runs along.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Runs parallel to x.
    X,
    /// Runs parallel to y.
    Y,
}

impl Axis {
    /// Component index along the axis.
    #[must_use]
    pub const fn along(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }

    /// Component index of the in-plane perpendicular.
    #[must_use]
    pub const fn across(self) -> usize {
        match self {
            Self::X => 1,
            Self::Y => 0,
        }
    }
}

/// Straight trace of rectangular cross-section.
///
/// Endpoints, width and thickness are given in millimetres; the cached
/// electrical values are computed once, in centimetre units, when the segment
/// is built:
///
/// * `R = ρ · l / (t · w)` in ohms,
/// * `L = 0.002 · l · [ln(2l / (w + t)) + 0.50049 + (w + t) / (3l)]` in µH.
///
/// With the `serde` feature a segment is stored as its geometry and material
/// only, and deserializing rebuilds it through [`Segment::new`].
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "SegmentRecord", try_from = "SegmentRecord")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start: R3,
    end: R3,
    material: ConductorMaterial,
    width_cm: Scalar,
    thickness_cm: Scalar,
    length_cm: Scalar,
    resistance: Scalar,
    inductance: Scalar,
}

impl Segment {
    /// Builds a segment from `start` to `end` (mm) of the given trace width (mm).
    ///
    /// Thickness and resistivity come from `material`.
    pub fn new(
        start: R3,
        end: R3,
        width: Scalar,
        material: &ConductorMaterial,
    ) -> Result<Self, GeometryError> {
        for point in [start, end] {
            if !point.iter().all(|c| c.is_finite()) {
                return Err(GeometryError::NonFiniteCoordinate(point));
            }
        }
        let width = GeometryError::require_positive("width", width)?;
        let thickness = GeometryError::require_positive("thickness", material.thickness)?;

        let length = (end - start).norm();
        if length <= 0.0 {
            return Err(GeometryError::DegenerateSegment { start, end });
        }

        let length_cm = mm_to_cm(length);
        let width_cm = mm_to_cm(width);
        let thickness_cm = mm_to_cm(thickness);

        let resistance = material.resistivity_per_cm() * length_cm / (thickness_cm * width_cm);

        let perimeter = width_cm + thickness_cm;
        let inductance = 0.002
            * length_cm
            * ((2.0 * length_cm / perimeter).ln() + 0.50049 + perimeter / (3.0 * length_cm));

        Ok(Self {
            start,
            end,
            material: *material,
            width_cm,
            thickness_cm,
            length_cm,
            resistance,
            inductance,
        })
    }

    /// Start point (mm).
    #[must_use]
    pub const fn start(&self) -> &R3 {
        &self.start
    }

    /// End point (mm).
    #[must_use]
    pub const fn end(&self) -> &R3 {
        &self.end
    }

    /// Conductor the segment was built from.
    #[must_use]
    pub const fn material(&self) -> &ConductorMaterial {
        &self.material
    }

    /// Trace width (mm).
    #[must_use]
    pub fn width(&self) -> Scalar {
        self.width_cm * MM_PER_CM
    }

    /// Conductor thickness (mm).
    #[must_use]
    pub fn thickness(&self) -> Scalar {
        self.thickness_cm * MM_PER_CM
    }

    /// Centre-line length (mm).
    #[must_use]
    pub fn length(&self) -> Scalar {
        self.length_cm * MM_PER_CM
    }

    pub(crate) const fn width_cm(&self) -> Scalar {
        self.width_cm
    }

    pub(crate) const fn thickness_cm(&self) -> Scalar {
        self.thickness_cm
    }

    pub(crate) const fn length_cm(&self) -> Scalar {
        self.length_cm
    }

    /// DC resistance in ohms.
    #[must_use]
    pub const fn resistance(&self) -> Scalar {
        self.resistance
    }

    /// Partial self-inductance in microhenries.
    #[must_use]
    pub const fn self_inductance(&self) -> Scalar {
        self.inductance
    }

    /// Dominant in-plane axis, taken from the endpoint delta.
    #[must_use]
    pub fn axis(&self) -> Axis {
        let delta = self.end - self.start;
        if delta.x.abs() > delta.y.abs() {
            Axis::X
        } else {
            Axis::Y
        }
    }

    /// Unit vector from start to end.
    #[must_use]
    pub fn direction(&self) -> R3 {
        (self.end - self.start) / self.length()
    }

    /// Mutual inductance (µH) with `other` after translating it by `offset` (mm).
    ///
    /// Both segments are assumed parallel; see [`kernel::mutual_inductance`].
    pub fn mutual_inductance(&self, other: &Self, offset: &R3) -> Result<Scalar, KernelFault> {
        kernel::mutual_inductance(self, other, offset)
    }
}

/// Serialized form of a [`Segment`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SegmentRecord {
    start: R3,
    end: R3,
    width: Scalar,
    material: ConductorMaterial,
}

#[cfg(feature = "serde")]
impl From<Segment> for SegmentRecord {
    fn from(segment: Segment) -> Self {
        Self {
            width: segment.width(),
            start: segment.start,
            end: segment.end,
            material: segment.material,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<SegmentRecord> for Segment {
    type Error = GeometryError;

    fn try_from(record: SegmentRecord) -> Result<Self, Self::Error> {
        let material =
            ConductorMaterial::new(record.material.resistivity, record.material.thickness)?;
        Self::new(record.start, record.end, record.width, &material)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn trace(length: Scalar) -> Segment {
        Segment::new(
            R3::zeros(),
            R3::new(length, 0.0, 0.0),
            0.5,
            &ConductorMaterial::copper(),
        )
        .unwrap()
    }

    #[test]
    fn forty_millimetre_trace_matches_grover() {
        let seg = trace(40.0);
        assert_relative_eq!(seg.self_inductance(), 0.044_364_6, max_relative = 1.0e-5);
        assert_relative_eq!(seg.resistance(), 0.0768, max_relative = 1.0e-9);
        assert_relative_eq!(seg.length(), 40.0, epsilon = 1.0e-12);
    }

    #[test]
    fn electrical_values_are_positive_and_finite() {
        for length in [0.2, 1.0, 7.5, 30.0, 120.0] {
            let seg = trace(length);
            assert!(seg.self_inductance().is_finite() && seg.self_inductance() > 0.0);
            assert!(seg.resistance().is_finite() && seg.resistance() > 0.0);
        }
    }

    #[test]
    fn self_inductance_grows_with_length() {
        let lengths = [1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 80.0];
        let values: Vec<Scalar> = lengths.iter().map(|&l| trace(l).self_inductance()).collect();
        for pair in values.windows(2) {
            assert!(pair[1] > pair[0], "{values:?}");
        }
    }

    #[test]
    fn zero_length_segment_is_rejected() {
        let p = R3::new(3.0, 4.0, 0.0);
        let err = Segment::new(p, p, 0.5, &ConductorMaterial::copper()).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateSegment { start: p, end: p });
    }

    #[test]
    fn non_finite_endpoint_is_rejected() {
        let err = Segment::new(
            R3::zeros(),
            R3::new(Scalar::NAN, 1.0, 0.0),
            0.5,
            &ConductorMaterial::copper(),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::NonFiniteCoordinate(_)));
    }

    #[test]
    fn axis_follows_endpoint_delta() {
        let m = ConductorMaterial::copper();
        let along_x = Segment::new(R3::new(5.0, 1.0, 0.0), R3::new(-5.0, 1.0, 0.0), 0.3, &m).unwrap();
        let along_y = Segment::new(R3::new(2.0, 0.0, 0.0), R3::new(2.0, 9.0, 0.0), 0.3, &m).unwrap();
        assert_eq!(along_x.axis(), Axis::X);
        assert_eq!(along_y.axis(), Axis::Y);
        assert_relative_eq!(along_x.direction().x, -1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn rebuilding_from_exported_geometry_reproduces_values() {
        let m = ConductorMaterial::copper();
        let original = Segment::new(R3::new(1.5, 2.0, 0.075), R3::new(1.5, 31.0, 0.075), 0.45, &m).unwrap();
        let rebuilt = Segment::new(*original.start(), *original.end(), original.width(), &m).unwrap();
        assert_relative_eq!(rebuilt.self_inductance(), original.self_inductance(), max_relative = 1.0e-12);
        assert_relative_eq!(rebuilt.resistance(), original.resistance(), max_relative = 1.0e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializing_rebuilds_from_geometry() {
        let m = ConductorMaterial::copper();
        let seg = Segment::new(R3::new(1.0, 2.0, 0.0), R3::new(1.0, 22.0, 0.0), 0.4, &m).unwrap();
        let json = serde_json::to_string(&seg).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.start(), seg.start());
        assert_relative_eq!(back.self_inductance(), seg.self_inductance(), max_relative = 1.0e-12);
        assert_relative_eq!(back.resistance(), seg.resistance(), max_relative = 1.0e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializing_a_zero_length_segment_fails() {
        let json = r#"{
            "start": [3.0, 4.0, 0.0],
            "end": [3.0, 4.0, 0.0],
            "width": 0.5,
            "material": { "resistivity": 1.68e-5, "thickness": 0.0175 }
        }"#;
        let err = serde_json::from_str::<Segment>(json).unwrap_err();
        assert!(err.to_string().contains("coincide"), "{err}");

        let cached_fields = r#"{
            "start": [3.0, 4.0, 0.0],
            "end": [3.0, 4.0, 0.0],
            "width_cm": 0.05,
            "length_cm": 0.0,
            "resistance": -1.0,
            "inductance": 42.0
        }"#;
        assert!(serde_json::from_str::<Segment>(cached_fields).is_err());
    }
}
