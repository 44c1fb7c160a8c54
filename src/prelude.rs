//! Convenience re-exports for designing and scoring NFC coils.

pub use crate::coil::{
    Coil, CoilDesign, InductanceBreakdown, MutualBreakdown, Stackup, WindingDirection,
};
pub use crate::constants::*;
pub use crate::coupling::{
    dissipated_power, evaluate, induced_voltage, quality_factor, recommended_turns,
    transfer_at, transfer_impedance, CouplingConfig, CouplingReport,
};
pub use crate::errors::{GeometryError, NfcCoilError};
pub use crate::layout::{copper_layer, export, LayoutOptions, Primitive};
pub use crate::materials::{ConductorMaterial, DesignRules};
pub use crate::math::{mm_to_cm, CompensatedSum, Scalar, R2, R3};
pub use crate::peec::{mutual_inductance, Axis, KernelFault, Segment};
pub use crate::sweep::{
    arange, best_turn_count, explore, linspace, rank_turn_counts, transfer_map, DesignSpace,
    Exploration, OffsetGrid, SweepRange, TransferMap, TurnSweep,
};
