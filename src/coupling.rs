//! Reader/tag figures of merit at the NFC carrier.
//!
//! All functions take inductances in µH, resistances in Ω and an angular
//! frequency in rad/µs, so `ω·L` is in ohms. Reference: "NFC antenna design
//! calculator", J. Commun. 8(9), 2013.

use num_complex::Complex;

use crate::coil::Coil;
use crate::constants::{angular_frequency, DRIVE_CURRENT, LOAD_RESISTANCE, NFC_CARRIER_MHZ};
use crate::errors::NfcCoilError;
use crate::math::{Scalar, R3};

/// Operating point used when scoring a reader/tag pair.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingConfig {
    /// Carrier frequency in MHz.
    pub carrier_mhz: Scalar,
    /// Tag load resistance in Ω.
    pub load_resistance: Scalar,
    /// Reader drive current in A.
    pub drive_current: Scalar,
}

impl CouplingConfig {
    /// Carrier angular frequency ω₀ (rad/µs).
    #[must_use]
    pub fn omega(&self) -> Scalar {
        angular_frequency(self.carrier_mhz)
    }
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            carrier_mhz: NFC_CARRIER_MHZ,
            load_resistance: LOAD_RESISTANCE,
            drive_current: DRIVE_CURRENT,
        }
    }
}

/// Loaded quality factor `Q = 1 / (ωL / R_load + R / (ωL))`.
#[must_use]
pub fn quality_factor(omega: Scalar, inductance: Scalar, resistance: Scalar, load: Scalar) -> Scalar {
    let reactance = omega * inductance;
    1.0 / (reactance / load + resistance / reactance)
}

/// Transferred impedance `R_t = ω · k² · L · Q`.
#[must_use]
pub fn transfer_impedance(omega: Scalar, k: Scalar, inductance: Scalar, q: Scalar) -> Scalar {
    omega * k * k * inductance * q
}

/// Turn count that matches the coil to its load, `⌈(2·R·R_load / (ω²L²))^⅓⌉`.
#[must_use]
pub fn recommended_turns(omega: Scalar, inductance: Scalar, resistance: Scalar, load: Scalar) -> u32 {
    let ratio = 2.0 * resistance * load / (omega * omega * inductance * inductance);
    // Saturating float-to-int cast; NaN maps to zero.
    ratio.cbrt().ceil() as u32
}

/// Voltage induced across the transferred impedance, `V = I · R_t`.
#[must_use]
pub fn induced_voltage(transfer: Scalar, current: Scalar) -> Scalar {
    current * transfer
}

/// Power dissipated in the transferred impedance, `P = I² · R_t`.
#[must_use]
pub fn dissipated_power(transfer: Scalar, current: Scalar) -> Scalar {
    current * current * transfer
}

/// Figures of merit for one reader/tag placement.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CouplingReport {
    /// Loaded quality factor of the tag.
    pub quality_factor: Scalar,
    /// Magnitude of the coupling coefficient.
    pub coupling: Scalar,
    /// Transferred impedance R_t (Ω).
    pub transfer_impedance: Scalar,
    /// Turn count that would match the tag to its load.
    pub recommended_turns: u32,
    /// Induced voltage at the configured drive current (V).
    pub voltage: Scalar,
    /// Dissipated power at the configured drive current (W).
    pub power: Scalar,
    /// Tag series impedance at the carrier (Ω).
    pub tag_impedance: Complex<Scalar>,
}

/// Scores `tag` placed at `offset` (mm) relative to `reader`.
///
/// Q and the recommended turn count depend only on the tag; `k` uses its
/// magnitude, and `R_t` is referred to the reader's inductance.
pub fn evaluate(
    reader: &Coil,
    tag: &Coil,
    offset: &R3,
    config: &CouplingConfig,
) -> Result<CouplingReport, NfcCoilError> {
    let omega = config.omega();
    let q = quality_factor(omega, tag.inductance(), tag.resistance(), config.load_resistance);
    let k = reader.coupling_coefficient(tag, offset)?.abs();
    let r_t = transfer_impedance(omega, k, reader.inductance(), q);
    Ok(CouplingReport {
        quality_factor: q,
        coupling: k,
        transfer_impedance: r_t,
        recommended_turns: recommended_turns(
            omega,
            tag.inductance(),
            tag.resistance(),
            config.load_resistance,
        ),
        voltage: induced_voltage(r_t, config.drive_current),
        power: dissipated_power(r_t, config.drive_current),
        tag_impedance: tag.impedance(omega),
    })
}

/// Transferred impedance of `tag` at `offset`, using the Q already assigned to the tag.
///
/// Falls back to computing Q when none has been assigned.
pub fn transfer_at(
    reader: &Coil,
    tag: &Coil,
    offset: &R3,
    config: &CouplingConfig,
) -> Result<Scalar, NfcCoilError> {
    let omega = config.omega();
    let q = tag.quality_factor().unwrap_or_else(|| {
        quality_factor(omega, tag.inductance(), tag.resistance(), config.load_resistance)
    });
    let k = reader.coupling_coefficient(tag, offset)?.abs();
    Ok(transfer_impedance(omega, k, reader.inductance(), q))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::coil::{CoilDesign, Stackup};
    use crate::constants::nfc_angular_frequency;

    fn coil(width: Scalar, length: Scalar, turns: u32, gap: Scalar, trace: Scalar) -> Coil {
        CoilDesign::new(width, length, turns, Some(gap), Some(trace))
            .unwrap()
            .design_copper(Stackup::default())
            .unwrap()
    }

    #[test]
    fn quality_factor_peaks_at_matched_reactance() {
        let w = nfc_angular_frequency();
        // Maximum of 1/(ωL/Rl + R/(ωL)) is at ωL = √(R·Rl), where Q = √(Rl/R)/2.
        let (r, load): (Scalar, Scalar) = (1.0, 1250.0);
        let l_opt = (r * load).sqrt() / w;
        let q_opt = quality_factor(w, l_opt, r, load);
        assert_relative_eq!(q_opt, (load / r).sqrt() / 2.0, max_relative = 1.0e-12);
        assert!(quality_factor(w, 0.5 * l_opt, r, load) < q_opt);
        assert!(quality_factor(w, 2.0 * l_opt, r, load) < q_opt);
    }

    #[test]
    fn transfer_voltage_and_power_follow_current() {
        let w = nfc_angular_frequency();
        let r_t = transfer_impedance(w, 0.1, 2.0, 10.0);
        assert_relative_eq!(r_t, w * 0.01 * 2.0 * 10.0, max_relative = 1.0e-12);
        assert_relative_eq!(induced_voltage(r_t, 0.06), 0.06 * r_t);
        assert_relative_eq!(dissipated_power(r_t, 0.06), 0.0036 * r_t);
    }

    #[test]
    fn recommended_turns_rounds_up() {
        let w = nfc_angular_frequency();
        // Choose L so the ratio is exactly 8: the cube root is 2.
        let (r, load): (Scalar, Scalar) = (1.0, 1250.0);
        let l = (2.0 * r * load / 8.0).sqrt() / w;
        assert_eq!(recommended_turns(w, l * 1.0001, r, load), 2);
        assert_eq!(recommended_turns(w, l * 0.9, r, load), 3);
        assert_eq!(recommended_turns(w, 0.761, 1.038, load), 1);
    }

    #[test]
    fn reader_tag_pair_at_twenty_millimetres_is_finite() {
        let reader = coil(80.0, 80.0, 3, 0.5, 1.0);
        let tag = coil(30.0, 40.0, 2, 0.3, 0.5);
        let report = evaluate(&reader, &tag, &R3::new(0.0, 0.0, 20.0), &CouplingConfig::default())
            .unwrap();
        assert!(report.quality_factor.is_finite() && report.quality_factor > 0.0);
        assert!(report.coupling.is_finite() && report.coupling > 0.0);
        assert!(report.transfer_impedance.is_finite() && report.transfer_impedance > 0.0);
        assert!(report.recommended_turns >= 1);
        assert_relative_eq!(report.tag_impedance.re, tag.resistance());
        assert_relative_eq!(report.power, 0.06 * report.voltage, max_relative = 1.0e-12);
    }

    #[test]
    fn assigned_quality_factor_is_used_for_transfer() {
        let reader = coil(80.0, 80.0, 3, 0.5, 1.0);
        let mut tag = coil(30.0, 40.0, 2, 0.3, 0.5);
        let config = CouplingConfig::default();
        let offset = R3::new(25.0, 20.0, 20.0);
        let report = evaluate(&reader, &tag, &offset, &config).unwrap();
        assert_relative_eq!(
            transfer_at(&reader, &tag, &offset, &config).unwrap(),
            report.transfer_impedance,
            max_relative = 1.0e-12
        );
        tag.set_quality_factor(2.0 * report.quality_factor);
        assert_relative_eq!(
            transfer_at(&reader, &tag, &offset, &config).unwrap(),
            2.0 * report.transfer_impedance,
            max_relative = 1.0e-12
        );
    }
}
