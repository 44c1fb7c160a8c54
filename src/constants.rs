//! Baseline physical constants, fabrication defaults, and NFC operating point.
//!
//! ## Units
//!
//! Geometry enters the crate in millimetres and is converted to centimetres
//! before any inductance formula is evaluated, so that the Grover/Hoer–Love
//! expressions produce microhenries directly. Frequencies are expressed in
//! megahertz, which makes `ω·L` come out in ohms when `L` is in microhenries.
//!
//! ## References
//!
//! - F. W. Grover, *Inductance Calculations*, Dover, 1946.
//! - C. Hoer and C. Love, "Exact Inductance Equations for Rectangular Conductors
//!   With Applications to More Complicated Geometries", J. Res. NBS 69C(2), 1965.
//!   <http://nvlpubs.nist.gov/nistpubs/jres/69C/jresv69Cn2p127_A1b.pdf>

use std::f64::consts::PI;

use crate::math::Scalar;

/// Resistivity of annealed copper in ohm-millimetres (1.68 × 10⁻⁸ Ω·m).
pub const COPPER_RESISTIVITY: Scalar = 1.68e-5;
/// Default copper foil thickness in millimetres (½ oz).
pub const CONDUCTOR_THICKNESS: Scalar = 0.0175;
/// Smallest gap between traces a typical PCB fab will produce, in millimetres.
pub const MIN_GAP: Scalar = 0.1;
/// Smallest trace width a typical PCB fab will produce, in millimetres.
pub const MIN_TRACE_WIDTH: Scalar = 0.1;
/// Default vertical distance between stacked coil layers, in millimetres.
pub const LAYER_SPACING: Scalar = 0.075;
/// Default number of stacked coil layers.
pub const LAYER_COUNT: usize = 2;

/// Millimetres per centimetre.
pub const MM_PER_CM: Scalar = 10.0;

/// NFC / ISO 14443 carrier frequency in megahertz.
pub const NFC_CARRIER_MHZ: Scalar = 13.56;
/// Default tag load resistance in ohms (`V²/P` of a typical tag IC).
pub const LOAD_RESISTANCE: Scalar = 1250.0;
/// Default reader antenna drive current in amperes.
pub const DRIVE_CURRENT: Scalar = 0.06;

/// Returns the angular frequency `2πf` for a frequency given in megahertz.
///
/// The result is in radians per microsecond, the unit that pairs with
/// inductances in microhenries.
#[inline]
#[must_use]
pub fn angular_frequency(mhz: Scalar) -> Scalar {
    2.0 * PI * mhz
}

/// Returns the NFC carrier angular frequency ω₀ (rad/µs).
#[inline]
#[must_use]
pub fn nfc_angular_frequency() -> Scalar {
    angular_frequency(NFC_CARRIER_MHZ)
}
