//! Design-space sweeps: offset maps, turn-count ranking and full geometry exploration.
//!
//! Every `(geometry, offset)` evaluation is independent. With the `parallel`
//! feature the maps and the exploration fan out over rayon's thread pool;
//! results keep the same order either way.

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info};

use crate::coil::{Coil, CoilDesign, Stackup};
use crate::coupling::{self, CouplingConfig, CouplingReport};
use crate::errors::NfcCoilError;
use crate::materials::{ConductorMaterial, DesignRules};
use crate::math::{CompensatedSum, Scalar, R3};

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Samples `start, start + step, …` strictly below `stop`.
///
/// Returns an empty vector for a non-positive or non-finite step.
#[must_use]
pub fn arange(start: Scalar, stop: Scalar, step: Scalar) -> Vec<Scalar> {
    if !(step.is_finite() && step > 0.0) || !(stop > start) {
        return Vec::new();
    }
    let n = ((stop - start) / step).ceil() as usize;
    (0..n).map(|i| start + step * i as Scalar).collect()
}

/// Half-open range `[start, stop)` sampled every `step`, in millimetres.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    /// First sample.
    pub start: Scalar,
    /// Exclusive upper bound.
    pub stop: Scalar,
    /// Distance between samples.
    pub step: Scalar,
}

impl SweepRange {
    /// Creates a sweep range.
    #[must_use]
    pub const fn new(start: Scalar, stop: Scalar, step: Scalar) -> Self {
        Self { start, stop, step }
    }

    /// A range holding a single value.
    #[must_use]
    pub fn fixed(value: Scalar) -> Self {
        Self::new(value, value + 1.0, 2.0)
    }

    /// Materialises the samples.
    #[must_use]
    pub fn values(&self) -> Vec<Scalar> {
        arange(self.start, self.stop, self.step)
    }
}

/// Rectangular grid of lateral tag positions at a fixed height.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetGrid {
    /// x offsets (mm).
    pub xs: Vec<Scalar>,
    /// y offsets (mm).
    pub ys: Vec<Scalar>,
    /// Height of the tag above the reader (mm).
    pub z: Scalar,
}

impl OffsetGrid {
    /// Creates a grid from explicit axes.
    #[must_use]
    pub fn new(xs: Vec<Scalar>, ys: Vec<Scalar>, z: Scalar) -> Self {
        Self { xs, ys, z }
    }

    /// Grid that moves a `tag_width × tag_length` tag past every corner of `reader`.
    ///
    /// Each axis spans `[-(reader + tag), 2 · (reader + tag))` in steps of `step`.
    #[must_use]
    pub fn around_reader(
        reader: &Coil,
        tag_width: Scalar,
        tag_length: Scalar,
        step: Scalar,
        z: Scalar,
    ) -> Self {
        let span_x = reader.width() + tag_width;
        let span_y = reader.length() + tag_length;
        Self::new(
            arange(-span_x, 2.0 * span_x, step),
            arange(-span_y, 2.0 * span_y, step),
            z,
        )
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    /// True if the grid has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positions in row-major order (y outer, x inner).
    pub fn points(&self) -> impl Iterator<Item = R3> + '_ {
        self.ys
            .iter()
            .flat_map(move |&y| self.xs.iter().map(move |&x| R3::new(x, y, self.z)))
    }
}

/// Transferred impedance sampled over an [`OffsetGrid`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransferMap {
    grid: OffsetGrid,
    values: Vec<Scalar>,
}

impl TransferMap {
    /// Grid the map was sampled on.
    #[must_use]
    pub const fn grid(&self) -> &OffsetGrid {
        &self.grid
    }

    /// R_t values in the grid's row-major order (Ω).
    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// R_t at column `ix`, row `iy`.
    #[must_use]
    pub fn at(&self, ix: usize, iy: usize) -> Option<Scalar> {
        if ix >= self.grid.xs.len() {
            return None;
        }
        self.values.get(iy * self.grid.xs.len() + ix).copied()
    }

    /// Largest R_t and the offset where it occurs.
    #[must_use]
    pub fn peak(&self) -> Option<(R3, Scalar)> {
        self.grid
            .points()
            .zip(self.values.iter().copied())
            .fold(None, |best, (point, value)| match best {
                Some((_, v)) if v >= value => best,
                _ => Some((point, value)),
            })
    }

    /// Mean R_t over the grid.
    #[must_use]
    pub fn mean(&self) -> Scalar {
        if self.values.is_empty() {
            return 0.0;
        }
        let sum: CompensatedSum = self.values.iter().copied().collect();
        sum.total() / self.values.len() as Scalar
    }

    /// Population standard deviation of R_t over the grid.
    #[must_use]
    pub fn std_dev(&self) -> Scalar {
        if self.values.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let sum: CompensatedSum = self.values.iter().map(|v| (v - mean).powi(2)).collect();
        (sum.total() / self.values.len() as Scalar).sqrt()
    }
}

/// Maps the transferred impedance of `tag` over every position of `grid`.
///
/// Uses the tag's assigned Q when present.
pub fn transfer_map(
    reader: &Coil,
    tag: &Coil,
    grid: &OffsetGrid,
    config: &CouplingConfig,
) -> Result<TransferMap, NfcCoilError> {
    let points: Vec<R3> = grid.points().collect();

    #[cfg(feature = "parallel")]
    let iter = points.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = points.iter();

    let values = iter
        .map(|offset| coupling::transfer_at(reader, tag, offset, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TransferMap {
        grid: grid.clone(),
        values,
    })
}

/// R_t statistics of one tag turn count over an offset grid.
#[derive(Debug, Clone)]
pub struct TurnCountSummary {
    /// The laid-out tag, with its Q assigned.
    pub coil: Coil,
    /// Largest R_t on the grid (Ω).
    pub peak: Scalar,
    /// Offset of the largest R_t (mm).
    pub peak_offset: R3,
    /// Mean R_t on the grid (Ω).
    pub mean: Scalar,
    /// Standard deviation of R_t on the grid (Ω).
    pub std_dev: Scalar,
}

/// Tag footprint and turn counts compared by [`rank_turn_counts`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSweep {
    /// Tag outer width (mm).
    pub width: Scalar,
    /// Tag outer length (mm).
    pub length: Scalar,
    /// Turn counts to compare.
    pub turns: Range<u32>,
    /// Gap between turns (mm); the trace width takes the rest of the pitch.
    pub gap: Scalar,
    /// Tag layer stack.
    pub stackup: Stackup,
    /// Spacing of the offset grid (mm).
    pub grid_step: Scalar,
    /// Height of the tag above the reader (mm).
    pub z: Scalar,
}

impl TurnSweep {
    /// Compares one to three turns of a `width × length` tag 20 mm above the reader,
    /// sampled every 5 mm.
    #[must_use]
    pub fn new(width: Scalar, length: Scalar) -> Self {
        Self {
            width,
            length,
            turns: 1..4,
            gap: 0.15,
            stackup: Stackup::default(),
            grid_step: 5.0,
            z: 20.0,
        }
    }
}

/// Lays out the tag for each turn count of `sweep` and maps its R_t around `reader`.
///
/// Turn counts whose geometry is invalid are skipped.
pub fn rank_turn_counts(
    reader: &Coil,
    sweep: &TurnSweep,
    config: &CouplingConfig,
) -> Result<Vec<TurnCountSummary>, NfcCoilError> {
    let (width, length) = (sweep.width, sweep.length);
    let grid = OffsetGrid::around_reader(reader, width, length, sweep.grid_step, sweep.z);
    let omega = config.omega();
    let mut summaries = Vec::new();
    for n in sweep.turns.clone() {
        let mut coil = match CoilDesign::new(width, length, n, Some(sweep.gap), None)
            .map_err(NfcCoilError::from)
            .and_then(|design| design.design_copper(sweep.stackup))
        {
            Ok(coil) => coil,
            Err(err) => {
                debug!(turns = n, %err, "skipping turn count");
                continue;
            }
        };
        coil.set_quality_factor(coupling::quality_factor(
            omega,
            coil.inductance(),
            coil.resistance(),
            config.load_resistance,
        ));
        let map = transfer_map(reader, &coil, &grid, config)?;
        let Some((peak_offset, peak)) = map.peak() else {
            continue;
        };
        summaries.push(TurnCountSummary {
            peak,
            peak_offset,
            mean: map.mean(),
            std_dev: map.std_dev(),
            coil,
        });
    }
    Ok(summaries)
}

/// Turn count with the highest peak R_t.
#[must_use]
pub fn best_turn_count(summaries: &[TurnCountSummary]) -> Option<&TurnCountSummary> {
    let best = summaries
        .iter()
        .max_by(|a, b| a.peak.total_cmp(&b.peak))?;
    info!(turns = best.coil.turns(), peak = best.peak, "best turn count");
    Some(best)
}

/// Parameter ranges explored by [`explore`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSpace {
    /// Outer widths (mm).
    pub widths: SweepRange,
    /// Outer lengths (mm).
    pub lengths: SweepRange,
    /// Turn counts per layer.
    pub turns: Range<u32>,
    /// Trace widths (mm).
    pub trace_widths: SweepRange,
    /// Fixed gap between turns (mm).
    pub gap: Scalar,
    /// Layer counts from 1 up to and including this value.
    pub max_layers: usize,
    /// Vertical spacing between layers (mm).
    pub layer_spacing: Scalar,
    /// Tag position relative to the reader (mm).
    pub offset: R3,
    /// Conductor used for every tag.
    pub material: ConductorMaterial,
    /// Fabrication limits applied to every tag.
    pub rules: DesignRules,
}

impl Default for DesignSpace {
    fn default() -> Self {
        Self {
            widths: SweepRange::new(10.0, 45.0, 5.0),
            lengths: SweepRange::new(8.0, 9.0, 1.0),
            turns: 1..11,
            trace_widths: SweepRange::new(0.15, 1.65, 0.1),
            gap: 0.15,
            max_layers: 1,
            layer_spacing: crate::constants::LAYER_SPACING,
            offset: R3::new(40.0, 30.0, 20.0),
            material: ConductorMaterial::copper(),
            rules: DesignRules::default(),
        }
    }
}

/// Geometry point of a [`DesignSpace`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignPoint {
    /// Outer width (mm).
    pub width: Scalar,
    /// Outer length (mm).
    pub length: Scalar,
    /// Turns per layer.
    pub turns: u32,
    /// Trace width (mm).
    pub trace_width: Scalar,
    /// Layer count.
    pub layers: usize,
}

impl DesignSpace {
    /// Every geometry point, layers outermost and turns innermost.
    #[must_use]
    pub fn points(&self) -> Vec<DesignPoint> {
        let (lengths, widths, traces) = (
            self.lengths.values(),
            self.widths.values(),
            self.trace_widths.values(),
        );
        let mut points = Vec::new();
        for layers in 1..=self.max_layers {
            for &length in &lengths {
                for &width in &widths {
                    for &trace_width in &traces {
                        for turns in self.turns.clone() {
                            points.push(DesignPoint {
                                width,
                                length,
                                turns,
                                trace_width,
                                layers,
                            });
                        }
                    }
                }
            }
        }
        points
    }

    fn evaluate(
        &self,
        point: &DesignPoint,
        reader: &Coil,
        config: &CouplingConfig,
    ) -> Result<Candidate, NfcCoilError> {
        let design = CoilDesign::new(
            point.width,
            point.length,
            point.turns,
            Some(self.gap),
            Some(point.trace_width),
        )?;
        let stackup = Stackup::new(point.layers, self.layer_spacing);
        let mut coil = design.design(stackup, &self.material, &self.rules)?;
        let report = coupling::evaluate(reader, &coil, &self.offset, config)?;
        coil.set_quality_factor(report.quality_factor);
        Ok(Candidate {
            point: *point,
            coil,
            report,
        })
    }
}

/// A geometry that laid out successfully, with its figures of merit.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Geometry point.
    pub point: DesignPoint,
    /// Laid-out tag with its Q assigned.
    pub coil: Coil,
    /// Figures of merit at the space's offset.
    pub report: CouplingReport,
}

/// A geometry that could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Geometry point.
    pub point: DesignPoint,
    /// Why it was rejected.
    pub error: NfcCoilError,
}

/// Result of [`explore`].
#[derive(Debug, Clone, Default)]
pub struct Exploration {
    /// Evaluated geometries in sweep order.
    pub candidates: Vec<Candidate>,
    /// Geometries skipped because of a geometry or kernel error.
    pub rejected: Vec<Rejection>,
}

impl Exploration {
    /// Candidate with the highest transferred impedance.
    #[must_use]
    pub fn best_by_transfer(&self) -> Option<&Candidate> {
        self.candidates.iter().max_by(|a, b| {
            a.report
                .transfer_impedance
                .total_cmp(&b.report.transfer_impedance)
        })
    }

    /// Candidate with the strongest coupling.
    #[must_use]
    pub fn best_by_coupling(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .max_by(|a, b| a.report.coupling.total_cmp(&b.report.coupling))
    }
}

/// Evaluates every geometry of `space` against `reader`.
///
/// Failing geometries are collected in [`Exploration::rejected`] and the sweep continues.
#[must_use]
pub fn explore(reader: &Coil, space: &DesignSpace, config: &CouplingConfig) -> Exploration {
    let points = space.points();

    #[cfg(feature = "parallel")]
    let iter = points.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = points.iter();

    let outcomes: Vec<_> = iter
        .map(|point| (point, space.evaluate(point, reader, config)))
        .collect();

    let mut exploration = Exploration::default();
    for (point, outcome) in outcomes {
        match outcome {
            Ok(candidate) => exploration.candidates.push(candidate),
            Err(error) => {
                debug!(?point, %error, "geometry rejected");
                exploration.rejected.push(Rejection {
                    point: *point,
                    error,
                });
            }
        }
    }

    if let Some(best) = exploration.best_by_transfer() {
        info!(
            width = best.point.width,
            length = best.point.length,
            turns = best.point.turns,
            trace_width = best.point.trace_width,
            layers = best.point.layers,
            transfer = best.report.transfer_impedance,
            "best design by R_t"
        );
    }
    exploration
}
