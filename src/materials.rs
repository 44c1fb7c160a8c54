//! Conductor material and fabrication parameters.

use crate::constants::{CONDUCTOR_THICKNESS, COPPER_RESISTIVITY, MIN_GAP, MIN_TRACE_WIDTH};
use crate::errors::GeometryError;
use crate::math::Scalar;

/// Electrical and physical properties of the trace conductor.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConductorMaterial {
    /// Resistivity in ohm-millimetres.
    pub resistivity: Scalar,
    /// Foil thickness in millimetres.
    pub thickness: Scalar,
}

impl ConductorMaterial {
    /// Creates a conductor description, rejecting non-positive values.
    pub fn new(resistivity: Scalar, thickness: Scalar) -> Result<Self, GeometryError> {
        GeometryError::require_positive("resistivity", resistivity)?;
        GeometryError::require_positive("thickness", thickness)?;
        Ok(Self {
            resistivity,
            thickness,
        })
    }

    /// Half-ounce copper foil.
    #[must_use]
    pub const fn copper() -> Self {
        Self {
            resistivity: COPPER_RESISTIVITY,
            thickness: CONDUCTOR_THICKNESS,
        }
    }

    /// Resistivity in ohm-centimetres.
    #[must_use]
    pub fn resistivity_per_cm(&self) -> Scalar {
        self.resistivity * 0.1
    }
}

impl Default for ConductorMaterial {
    fn default() -> Self {
        Self::copper()
    }
}

/// Minimum manufacturable feature sizes, in millimetres.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignRules {
    /// Smallest allowed spacing between adjacent turns.
    pub min_gap: Scalar,
    /// Smallest allowed trace width.
    pub min_trace_width: Scalar,
}

impl DesignRules {
    /// Rules that accept any positive gap and width.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            min_gap: 0.0,
            min_trace_width: 0.0,
        }
    }

    /// Checks a gap / trace width pair against the rules.
    pub fn check(&self, gap: Scalar, trace_width: Scalar) -> Result<(), GeometryError> {
        if gap < self.min_gap {
            return Err(GeometryError::BelowDesignRule {
                name: "gap",
                value: gap,
                minimum: self.min_gap,
            });
        }
        if trace_width < self.min_trace_width {
            return Err(GeometryError::BelowDesignRule {
                name: "trace width",
                value: trace_width,
                minimum: self.min_trace_width,
            });
        }
        Ok(())
    }
}

impl Default for DesignRules {
    fn default() -> Self {
        Self {
            min_gap: MIN_GAP,
            min_trace_width: MIN_TRACE_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn copper_resistivity_in_ohm_cm() {
        assert_relative_eq!(
            ConductorMaterial::copper().resistivity_per_cm(),
            1.68e-6,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn negative_thickness_is_rejected() {
        let err = ConductorMaterial::new(COPPER_RESISTIVITY, -0.01).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::NonPositiveDimension {
                name: "thickness",
                ..
            }
        ));
    }

    #[test]
    fn default_rules_reject_hairline_traces() {
        let rules = DesignRules::default();
        assert!(rules.check(0.15, 0.15).is_ok());
        assert!(matches!(
            rules.check(0.15, 0.05),
            Err(GeometryError::BelowDesignRule {
                name: "trace width",
                ..
            })
        ));
        assert!(DesignRules::unrestricted().check(0.01, 0.01).is_ok());
    }
}
