//! Gesture angle thresholds
//!
//! Values are empirically calibrated against a standing adult roughly two
//! meters from the sensor. All angles are in degrees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shoulder angle at or below which the arm counts as tucked in
pub const ARM_IN: f64 = 30.0;
/// Upper bound of the lowered-arm band (exclusive of the tucked band)
pub const ARM_DOWN: f64 = 60.0;
/// Lower bound of the sideways-extended band
pub const ARM_OUT_MIN: f64 = 70.0;
/// Upper bound of the sideways-extended band
pub const ARM_OUT_MAX: f64 = 110.0;
/// Shoulder angle at or above which the arm counts as raised
pub const ARM_UP: f64 = 150.0;
/// Elbow angle at or above which the arm counts as straight
pub const ELBOW_STRAIGHT: f64 = 140.0;

/// Threshold validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("{name} ({value}) must lie in [0, 180]")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("{lower} ({lower_value}) must not exceed {upper} ({upper_value})")]
    Overlapping {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },
}

/// Angle thresholds for every gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    pub arm_in: f64,
    pub arm_down: f64,
    pub arm_out_min: f64,
    pub arm_out_max: f64,
    pub arm_up: f64,
    pub elbow_straight: f64,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            arm_in: ARM_IN,
            arm_down: ARM_DOWN,
            arm_out_min: ARM_OUT_MIN,
            arm_out_max: ARM_OUT_MAX,
            arm_up: ARM_UP,
            elbow_straight: ELBOW_STRAIGHT,
        }
    }
}

impl GestureThresholds {
    /// Wider bands for seated operators or noisy tracking
    pub fn relaxed() -> Self {
        GestureThresholds {
            arm_in: 35.0,
            arm_down: 65.0,
            arm_out_min: 65.0,
            arm_out_max: 115.0,
            arm_up: 140.0,
            elbow_straight: 130.0,
        }
    }

    /// Check that every threshold is a real angle and the shoulder bands
    /// are ordered without overlap.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let ordered = [
            ("arm_in", self.arm_in),
            ("arm_down", self.arm_down),
            ("arm_out_min", self.arm_out_min),
            ("arm_out_max", self.arm_out_max),
            ("arm_up", self.arm_up),
        ];

        // NaN fails the range check, so the ordering below compares reals only
        let all = ordered.iter().copied().chain([("elbow_straight", self.elbow_straight)]);
        for (name, value) in all {
            if !(0.0..=180.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }

        for pair in ordered.windows(2) {
            let (lower, lower_value) = pair[0];
            let (upper, upper_value) = pair[1];
            if lower_value > upper_value {
                return Err(ThresholdError::Overlapping {
                    lower,
                    lower_value,
                    upper,
                    upper_value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(GestureThresholds::default().validate().is_ok());
        assert!(GestureThresholds::relaxed().validate().is_ok());
    }

    #[test]
    fn test_overlapping_bands_rejected() {
        let thresholds = GestureThresholds {
            arm_down: 20.0,
            ..GestureThresholds::default()
        };

        let err = thresholds.validate().unwrap_err();
        assert!(matches!(
            err,
            ThresholdError::Overlapping {
                lower: "arm_in",
                upper: "arm_down",
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_thresholds_rejected() {
        for thresholds in [
            GestureThresholds {
                arm_down: f64::NAN,
                ..GestureThresholds::default()
            },
            GestureThresholds {
                arm_out_max: f64::INFINITY,
                ..GestureThresholds::default()
            },
            GestureThresholds {
                elbow_straight: f64::NAN,
                ..GestureThresholds::default()
            },
        ] {
            assert!(matches!(
                thresholds.validate(),
                Err(ThresholdError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_partial_override_from_json() {
        let thresholds: GestureThresholds = serde_json::from_str(r#"{ "arm_in": 25.0 }"#).unwrap();

        assert_eq!(thresholds.arm_in, 25.0);
        assert_eq!(thresholds.arm_up, ARM_UP);
    }
}
