#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Physical constants and default operating point.
pub mod constants;
/// Scalar and vector aliases, unit conversion and compensated summation.
pub mod math;
/// Conductor material and fabrication design rules.
pub mod materials;
/// Error types shared across the crate.
pub mod errors;
/// Partial-element segments and their mutual-inductance kernel.
pub mod peec;
/// Spiral coil layout and inductance.
pub mod coil;
/// Reader/tag coupling figures of merit.
pub mod coupling;
/// Board-layout primitives for laid-out coils.
pub mod layout;
/// Offset maps, turn-count ranking and design-space exploration.
pub mod sweep;

/// Common exports for downstream crates.
pub mod prelude;
