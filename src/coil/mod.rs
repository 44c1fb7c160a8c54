//! Rectangular spiral coils assembled from PEEC segments.
//!
//! A [`CoilDesign`] holds the outline and winding parameters; laying it out
//! over a [`Stackup`] produces an immutable [`Coil`] whose segment list,
//! inductance and resistance are fixed at construction.

mod winding;

use num_complex::Complex;
use tracing::debug;

use crate::constants::{LAYER_COUNT, LAYER_SPACING};
use crate::errors::{GeometryError, NfcCoilError};
use crate::materials::{ConductorMaterial, DesignRules};
use crate::math::{CompensatedSum, Scalar, R3};
use crate::peec::{KernelFault, Segment};

pub use winding::WindingDirection;
pub(crate) use winding::check_continuity;

/// Outline and winding parameters of a coil, in millimetres.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "DesignRecord")
)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoilDesign {
    width: Scalar,
    length: Scalar,
    turns: u32,
    gap: Scalar,
    trace_width: Scalar,
}

impl CoilDesign {
    /// Creates a design from the outer outline and turn count.
    ///
    /// A missing `gap` or `trace_width` is derived from the pitch available to
    /// each turn, `min(width, length) / (2 · turns)`: the gap takes half of it
    /// and the trace whatever the gap leaves.
    pub fn new(
        width: Scalar,
        length: Scalar,
        turns: u32,
        gap: Option<Scalar>,
        trace_width: Option<Scalar>,
    ) -> Result<Self, GeometryError> {
        let width = GeometryError::require_positive("width", width)?;
        let length = GeometryError::require_positive("length", length)?;
        if turns == 0 {
            return Err(GeometryError::ZeroTurns);
        }

        let pitch = width.min(length) / (2.0 * Scalar::from(turns));
        let gap = GeometryError::require_positive("gap", gap.unwrap_or(pitch / 2.0))?;
        let trace_width =
            GeometryError::require_positive("trace width", trace_width.unwrap_or(pitch - gap))?;

        Ok(Self {
            width,
            length,
            turns,
            gap,
            trace_width,
        })
    }

    /// Outer width along x (mm).
    #[must_use]
    pub const fn width(&self) -> Scalar {
        self.width
    }

    /// Outer length along y (mm).
    #[must_use]
    pub const fn length(&self) -> Scalar {
        self.length
    }

    /// Turns per layer.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.turns
    }

    /// Spacing between adjacent turns (mm).
    #[must_use]
    pub const fn gap(&self) -> Scalar {
        self.gap
    }

    /// Trace width (mm).
    #[must_use]
    pub const fn trace_width(&self) -> Scalar {
        self.trace_width
    }

    /// Centre-to-centre distance between adjacent turns (mm).
    #[must_use]
    pub fn pitch(&self) -> Scalar {
        self.gap + self.trace_width
    }

    /// Checks that the spiral fits its outline: `2 · pitch · turns ≤ min(width, length)`.
    pub fn check_fit(&self) -> Result<(), GeometryError> {
        let required = 2.0 * self.pitch() * Scalar::from(self.turns);
        let available = self.width.min(self.length);
        if required > available {
            return Err(GeometryError::InvalidDesign {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Lays out every layer of the stack-up and computes the coil's L and R.
    pub fn design(
        &self,
        stackup: Stackup,
        material: &ConductorMaterial,
        rules: &DesignRules,
    ) -> Result<Coil, NfcCoilError> {
        if stackup.layers == 0 {
            return Err(GeometryError::ZeroLayers.into());
        }
        rules.check(self.gap, self.trace_width)?;
        self.check_fit()?;

        let mut segments = Vec::with_capacity(stackup.layers * self.segments_per_layer());
        for layer in 0..stackup.layers {
            let z = stackup.height(layer);
            let layer_segments =
                winding::wind_layer(self, z, WindingDirection::for_layer(layer), material)?;
            check_continuity(&layer_segments)?;
            segments.extend(layer_segments);
        }

        let resistance: Scalar = segments.iter().map(Segment::resistance).sum();
        let inductance = InductanceBreakdown::of(&segments)?;
        debug!(
            width = self.width,
            length = self.length,
            turns = self.turns,
            layers = stackup.layers,
            segments = segments.len(),
            inductance = inductance.total(),
            resistance,
            "coil laid out"
        );

        Ok(Coil {
            design: *self,
            stackup,
            material: *material,
            segments,
            inductance,
            resistance,
            quality_factor: None,
        })
    }

    /// Lays out the design in half-ounce copper under the default design rules.
    pub fn design_copper(&self, stackup: Stackup) -> Result<Coil, NfcCoilError> {
        self.design(stackup, &ConductorMaterial::copper(), &DesignRules::default())
    }

    fn segments_per_layer(&self) -> usize {
        4 * self.turns as usize
    }
}

/// Number of stacked layers and their vertical spacing (mm).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stackup {
    /// Number of copper layers carrying the winding.
    pub layers: usize,
    /// Vertical distance between consecutive layers (mm).
    pub spacing: Scalar,
}

impl Stackup {
    /// Creates a stack-up description.
    #[must_use]
    pub const fn new(layers: usize, spacing: Scalar) -> Self {
        Self { layers, spacing }
    }

    /// A single-layer coil.
    #[must_use]
    pub const fn single() -> Self {
        Self::new(1, LAYER_SPACING)
    }

    /// Height of `layer` above the first one (mm).
    #[must_use]
    pub fn height(&self, layer: usize) -> Scalar {
        layer as Scalar * self.spacing
    }
}

impl Default for Stackup {
    fn default() -> Self {
        Self::new(LAYER_COUNT, LAYER_SPACING)
    }
}

/// Self-inductance of a coil split into its contributions (µH).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InductanceBreakdown {
    /// Sum of the segments' partial self-inductances.
    pub partial_self: Scalar,
    /// Mutual terms of parallel pairs with the same index modulo 4.
    pub additive: Scalar,
    /// Mutual terms of parallel pairs with different indices modulo 4.
    pub subtractive: Scalar,
}

impl InductanceBreakdown {
    /// Sums self terms and signed mutual terms over every unordered segment pair.
    ///
    /// Segments alternate between the x and y axes, so pairs with equal index
    /// parity are parallel; within those, equal index modulo 4 means the two
    /// currents run the same way.
    fn of(segments: &[Segment]) -> Result<Self, KernelFault> {
        let partial_self: Scalar = segments.iter().map(Segment::self_inductance).sum();
        let mut additive = CompensatedSum::new();
        let mut subtractive = CompensatedSum::new();
        for (i, a) in segments.iter().enumerate() {
            for (j, b) in segments.iter().enumerate().skip(i + 1) {
                if i % 2 != j % 2 {
                    continue;
                }
                let m = a.mutual_inductance(b, &R3::zeros())?;
                if i % 4 == j % 4 {
                    additive.add(m);
                } else {
                    subtractive.add(m);
                }
            }
        }
        Ok(Self {
            partial_self,
            additive: additive.total(),
            subtractive: subtractive.total(),
        })
    }

    /// Total coil inductance `ΣL + (M⁺ − M⁻)`.
    #[must_use]
    pub fn total(&self) -> Scalar {
        self.partial_self + (self.additive - self.subtractive)
    }
}

/// Pairwise mutual inductance between two coils, split by classification (µH).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutualBreakdown {
    /// Parallel pairs with different indices modulo 4.
    pub additive: Scalar,
    /// Parallel pairs with the same index modulo 4.
    pub subtractive: Scalar,
}

impl MutualBreakdown {
    /// Combined mutual inductance, `additive + subtractive`.
    #[must_use]
    pub fn total(&self) -> Scalar {
        self.additive + self.subtractive
    }
}

/// Laid-out coil with its cached electrical parameters.
///
/// With the `serde` feature only the design, stack-up, material and assigned
/// Q are stored; deserializing lays the coil out again. Design rules are not
/// re-applied.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "CoilRecord", try_from = "CoilRecord")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Coil {
    design: CoilDesign,
    stackup: Stackup,
    material: ConductorMaterial,
    segments: Vec<Segment>,
    inductance: InductanceBreakdown,
    resistance: Scalar,
    quality_factor: Option<Scalar>,
}

impl Coil {
    /// Parameters the coil was laid out from.
    #[must_use]
    pub const fn dimensions(&self) -> &CoilDesign {
        &self.design
    }

    /// Outer width (mm).
    #[must_use]
    pub const fn width(&self) -> Scalar {
        self.design.width
    }

    /// Outer length (mm).
    #[must_use]
    pub const fn length(&self) -> Scalar {
        self.design.length
    }

    /// Turns per layer.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.design.turns
    }

    /// Gap between turns (mm).
    #[must_use]
    pub const fn gap(&self) -> Scalar {
        self.design.gap
    }

    /// Trace width (mm).
    #[must_use]
    pub const fn trace_width(&self) -> Scalar {
        self.design.trace_width
    }

    /// Conductor thickness (mm).
    #[must_use]
    pub const fn trace_height(&self) -> Scalar {
        self.material.thickness
    }

    /// Number of layers.
    #[must_use]
    pub const fn layer_count(&self) -> usize {
        self.stackup.layers
    }

    /// Stack-up the coil was laid out on.
    #[must_use]
    pub const fn stackup(&self) -> &Stackup {
        &self.stackup
    }

    /// Every segment, layer by layer, in winding order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments grouped per layer.
    pub fn layers(&self) -> impl Iterator<Item = &[Segment]> + '_ {
        self.segments.chunks(self.design.segments_per_layer())
    }

    /// Total inductance (µH).
    #[must_use]
    pub fn inductance(&self) -> Scalar {
        self.inductance.total()
    }

    /// Self and mutual contributions to the inductance.
    #[must_use]
    pub const fn inductance_breakdown(&self) -> &InductanceBreakdown {
        &self.inductance
    }

    /// Total DC resistance (Ω).
    #[must_use]
    pub const fn resistance(&self) -> Scalar {
        self.resistance
    }

    /// Quality factor assigned after construction, if any.
    #[must_use]
    pub const fn quality_factor(&self) -> Option<Scalar> {
        self.quality_factor
    }

    /// Records the quality factor computed for this coil's load.
    pub fn set_quality_factor(&mut self, q: Scalar) {
        self.quality_factor = Some(q);
    }

    /// Series impedance `R + jωL` at angular frequency `omega` (rad/µs).
    #[must_use]
    pub fn impedance(&self, omega: Scalar) -> Complex<Scalar> {
        Complex::new(self.resistance, omega * self.inductance())
    }

    /// Mutual inductance with `other` translated by `offset` (mm), split by classification.
    ///
    /// Coils generally face each other rather than share a plane, so pairs
    /// whose indices differ modulo 4 count as additive here, the opposite of
    /// the intra-coil rule in [`InductanceBreakdown`].
    pub fn mutual_breakdown(&self, other: &Self, offset: &R3) -> Result<MutualBreakdown, KernelFault> {
        let mut additive = CompensatedSum::new();
        let mut subtractive = CompensatedSum::new();
        for (i, a) in self.segments.iter().enumerate() {
            for (j, b) in other.segments.iter().enumerate() {
                if i % 2 != j % 2 {
                    continue;
                }
                let m = a.mutual_inductance(b, offset)?;
                if i % 4 != j % 4 {
                    additive.add(m);
                } else {
                    subtractive.add(m);
                }
            }
        }
        Ok(MutualBreakdown {
            additive: additive.total(),
            subtractive: subtractive.total(),
        })
    }

    /// Mutual inductance (µH) with `other` translated by `offset` (mm).
    pub fn mutual_inductance(&self, other: &Self, offset: &R3) -> Result<Scalar, KernelFault> {
        Ok(self.mutual_breakdown(other, offset)?.total())
    }

    /// Coupling coefficient `k = M / √(L₁·L₂)`.
    ///
    /// Not clamped to [−1, 1]; geometries outside the model's accuracy can exceed it.
    pub fn coupling_coefficient(&self, other: &Self, offset: &R3) -> Result<Scalar, NfcCoilError> {
        let product = self.inductance() * other.inductance();
        if !(product.is_finite() && product > 0.0) {
            return Err(NfcCoilError::NonPhysicalInductance { value: product });
        }
        Ok(self.mutual_inductance(other, offset)? / product.sqrt())
    }
}

/// Unvalidated [`CoilDesign`] fields.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct DesignRecord {
    width: Scalar,
    length: Scalar,
    turns: u32,
    gap: Scalar,
    trace_width: Scalar,
}

#[cfg(feature = "serde")]
impl TryFrom<DesignRecord> for CoilDesign {
    type Error = GeometryError;

    fn try_from(r: DesignRecord) -> Result<Self, Self::Error> {
        Self::new(r.width, r.length, r.turns, Some(r.gap), Some(r.trace_width))
    }
}

/// Serialized form of a [`Coil`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct CoilRecord {
    design: CoilDesign,
    stackup: Stackup,
    material: ConductorMaterial,
    quality_factor: Option<Scalar>,
}

#[cfg(feature = "serde")]
impl From<Coil> for CoilRecord {
    fn from(coil: Coil) -> Self {
        Self {
            design: coil.design,
            stackup: coil.stackup,
            material: coil.material,
            quality_factor: coil.quality_factor,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<CoilRecord> for Coil {
    type Error = NfcCoilError;

    fn try_from(record: CoilRecord) -> Result<Self, Self::Error> {
        let material =
            ConductorMaterial::new(record.material.resistivity, record.material.thickness)?;
        let mut coil = record
            .design
            .design(record.stackup, &material, &DesignRules::unrestricted())?;
        coil.quality_factor = record.quality_factor;
        Ok(coil)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::nfc_angular_frequency;

    fn tag() -> Coil {
        CoilDesign::new(30.0, 40.0, 2, Some(0.3), Some(0.5))
            .unwrap()
            .design_copper(Stackup::default())
            .unwrap()
    }

    fn reader() -> Coil {
        CoilDesign::new(80.0, 80.0, 3, Some(0.5), Some(1.0))
            .unwrap()
            .design_copper(Stackup::default())
            .unwrap()
    }

    #[test]
    fn two_layer_two_turn_coil_has_sixteen_segments() {
        let coil = tag();
        assert_eq!(coil.segments().len(), 16);
        assert_eq!(coil.layer_count(), 2);
        assert!(coil.inductance().is_finite() && coil.inductance() > 0.0);
        assert!(coil.resistance().is_finite() && coil.resistance() > 0.0);
        assert_relative_eq!(coil.inductance(), 0.761_09, max_relative = 1.0e-4);
    }

    #[test]
    fn resistance_and_self_terms_sum_over_segments() {
        let coil = tag();
        let r: Scalar = coil.segments().iter().map(Segment::resistance).sum();
        let l: Scalar = coil.segments().iter().map(Segment::self_inductance).sum();
        assert_relative_eq!(coil.resistance(), r, max_relative = 1.0e-12);
        assert_relative_eq!(coil.inductance_breakdown().partial_self, l, max_relative = 1.0e-12);
        let b = coil.inductance_breakdown();
        assert_relative_eq!(coil.inductance(), b.partial_self + b.additive - b.subtractive);
    }

    #[test]
    fn layers_are_stacked_and_contiguous() {
        let coil = tag();
        let layers: Vec<&[Segment]> = coil.layers().collect();
        assert_eq!(layers.len(), 2);
        for (n, layer) in layers.iter().enumerate() {
            assert_eq!(layer.len(), 8);
            check_continuity(layer).unwrap();
            for seg in *layer {
                assert_relative_eq!(seg.start().z, n as Scalar * 0.075, epsilon = 1.0e-12);
            }
        }
    }

    #[test]
    fn oversized_winding_is_an_invalid_design() {
        let design = CoilDesign::new(10.0, 10.0, 10, Some(1.0), Some(1.0)).unwrap();
        let err = design.design_copper(Stackup::default()).unwrap_err();
        assert_eq!(
            err,
            NfcCoilError::Geometry(GeometryError::InvalidDesign {
                required: 40.0,
                available: 10.0,
            })
        );
    }

    #[test]
    fn missing_gap_and_width_split_the_pitch() {
        let design = CoilDesign::new(30.0, 40.0, 3, None, None).unwrap();
        assert_relative_eq!(design.gap(), 2.5);
        assert_relative_eq!(design.trace_width(), 2.5);
        design.check_fit().unwrap();

        let gap_only = CoilDesign::new(40.0, 30.0, 3, Some(1.0), None).unwrap();
        assert_relative_eq!(gap_only.trace_width(), 4.0);
    }

    #[test]
    fn zero_turns_and_layers_are_rejected() {
        assert_eq!(
            CoilDesign::new(30.0, 40.0, 0, None, None).unwrap_err(),
            GeometryError::ZeroTurns
        );
        let design = CoilDesign::new(30.0, 40.0, 2, None, None).unwrap();
        assert_eq!(
            design.design_copper(Stackup::new(0, 0.075)).unwrap_err(),
            NfcCoilError::Geometry(GeometryError::ZeroLayers)
        );
    }

    #[test]
    fn design_rules_are_enforced() {
        let design = CoilDesign::new(30.0, 40.0, 2, Some(0.05), Some(0.5)).unwrap();
        let err = design.design_copper(Stackup::single()).unwrap_err();
        assert!(matches!(
            err,
            NfcCoilError::Geometry(GeometryError::BelowDesignRule { name: "gap", .. })
        ));
        let relaxed = design
            .design(Stackup::single(), &ConductorMaterial::copper(), &DesignRules::unrestricted())
            .unwrap();
        assert_eq!(relaxed.segments().len(), 8);
    }

    #[test]
    fn auto_split_below_minimum_gap_needs_relaxed_rules() {
        // 6 mm across 16 turns leaves a 0.1875 mm pitch: 0.09375 mm gap and trace.
        let design = CoilDesign::new(6.0, 40.0, 16, None, None).unwrap();
        assert!(matches!(
            design.design_copper(Stackup::default()),
            Err(NfcCoilError::Geometry(GeometryError::BelowDesignRule { .. }))
        ));
        let coil = design
            .design(Stackup::default(), &ConductorMaterial::copper(), &DesignRules::unrestricted())
            .unwrap();
        assert_eq!(coil.segments().len(), 128);
        assert!(coil.inductance() > 0.0);
    }

    #[test]
    fn single_layer_has_less_inductance_than_two() {
        let design = CoilDesign::new(30.0, 40.0, 2, Some(0.3), Some(0.5)).unwrap();
        let single = design.design_copper(Stackup::single()).unwrap();
        assert_eq!(single.segments().len(), 8);
        assert!(single.inductance() > 0.0);
        assert!(single.inductance() < tag().inductance());
    }

    #[test]
    fn impedance_combines_resistance_and_reactance() {
        let coil = tag();
        let omega = nfc_angular_frequency();
        let z = coil.impedance(omega);
        assert_relative_eq!(z.re, coil.resistance());
        assert_relative_eq!(z.im, omega * coil.inductance());
    }

    #[test]
    fn quality_factor_is_assigned_externally() {
        let mut coil = tag();
        assert_eq!(coil.quality_factor(), None);
        coil.set_quality_factor(14.7);
        assert_eq!(coil.quality_factor(), Some(14.7));
    }

    #[test]
    fn coupling_is_symmetric_without_offset() {
        let (a, b) = (reader(), tag());
        let ab = a.coupling_coefficient(&b, &R3::zeros()).unwrap();
        let ba = b.coupling_coefficient(&a, &R3::zeros()).unwrap();
        assert!(ab.is_finite());
        assert_relative_eq!(ab.abs(), ba.abs(), max_relative = 1.0e-5);
    }

    #[test]
    fn coupling_weakens_with_height() {
        let (r, t) = (reader(), tag());
        let k: Vec<Scalar> = [5.0, 10.0, 20.0, 50.0, 100.0, 200.0]
            .iter()
            .map(|&z| {
                r.coupling_coefficient(&t, &R3::new(25.0, 20.0, z))
                    .unwrap()
                    .abs()
            })
            .collect();
        for pair in k.windows(2) {
            assert!(pair[1] < pair[0], "{k:?}");
        }
    }

    #[test]
    fn mutual_is_the_sum_of_both_classes() {
        let (r, t) = (reader(), tag());
        let offset = R3::new(25.0, 20.0, 20.0);
        let parts = r.mutual_breakdown(&t, &offset).unwrap();
        let m = r.mutual_inductance(&t, &offset).unwrap();
        assert_relative_eq!(m, parts.additive + parts.subtractive);
    }

    #[test]
    fn rebuilt_segments_reproduce_electrical_values() {
        let coil = tag();
        let material = ConductorMaterial::copper();
        for seg in coil.segments() {
            let rebuilt = Segment::new(*seg.start(), *seg.end(), seg.width(), &material).unwrap();
            assert_relative_eq!(rebuilt.self_inductance(), seg.self_inductance(), max_relative = 1.0e-12);
            assert_relative_eq!(rebuilt.resistance(), seg.resistance(), max_relative = 1.0e-12);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializing_lays_the_coil_out_again() {
        let mut coil = tag();
        coil.set_quality_factor(12.5);
        let json = serde_json::to_string(&coil).unwrap();
        let back: Coil = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segments().len(), 16);
        assert_eq!(back.quality_factor(), Some(12.5));
        assert_relative_eq!(back.inductance(), coil.inductance(), max_relative = 1.0e-12);
        assert_relative_eq!(back.resistance(), coil.resistance(), max_relative = 1.0e-12);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserializing_an_oversized_winding_fails() {
        let json = r#"{
            "design": { "width": 10.0, "length": 10.0, "turns": 10, "gap": 1.0, "trace_width": 1.0 },
            "stackup": { "layers": 2, "spacing": 0.075 },
            "material": { "resistivity": 1.68e-5, "thickness": 0.0175 },
            "quality_factor": null
        }"#;
        let err = serde_json::from_str::<Coil>(json).unwrap_err();
        assert!(err.to_string().contains("invalid design"), "{err}");

        let zero_turns = json.replace("\"turns\": 10", "\"turns\": 0");
        assert!(serde_json::from_str::<Coil>(&zero_turns).is_err());
    }
}
