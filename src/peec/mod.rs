//! Partial-element building blocks: straight rectangular conductors and the
//! closed-form mutual-inductance kernel that couples them.

mod kernel;
mod segment;

pub use kernel::{mutual_inductance, rectangular_primitive, KernelFault};
pub use segment::{Axis, Segment};
