//! Splitter configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the cluster splitter.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitterConfig {
    /// ADC charge carried by one quantization unit.
    pub charge_per_unit: f32,
    /// Expected ADC charge of a single normal-incidence hit.
    pub central_mip_charge: f32,
    /// Fractional width of the logistic charge penalty in the assignment
    /// estimate.
    pub fractional_width: f32,
    /// Forced x position error assigned to split output clusters.
    /// Non-positive disables the assignment.
    pub force_x_error: f32,
    /// Forced y position error assigned to split output clusters.
    /// Non-positive disables the assignment.
    pub force_y_error: f32,
    /// Multiplier on the expected charge above which a cluster qualifies as
    /// a splitting candidate.
    pub charge_fraction_min: f32,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            charge_per_unit: 2000.0,
            central_mip_charge: 26_000.0,
            fractional_width: 0.4,
            force_x_error: 100.0,
            force_y_error: 150.0,
            charge_fraction_min: 2.0,
        }
    }
}

impl SplitterConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the charge per quantization unit.
    #[must_use]
    pub fn with_charge_per_unit(mut self, charge: f32) -> Self {
        self.charge_per_unit = charge;
        self
    }

    /// Sets the expected single-hit charge at normal incidence.
    #[must_use]
    pub fn with_central_mip_charge(mut self, charge: f32) -> Self {
        self.central_mip_charge = charge;
        self
    }

    /// Sets the fractional width of the charge penalty.
    #[must_use]
    pub fn with_fractional_width(mut self, width: f32) -> Self {
        self.fractional_width = width;
        self
    }

    /// Sets the forced position errors for split output clusters.
    #[must_use]
    pub fn with_forced_errors(mut self, x: f32, y: f32) -> Self {
        self.force_x_error = x;
        self.force_y_error = y;
        self
    }

    /// Sets the candidate-charge threshold multiplier.
    #[must_use]
    pub fn with_charge_fraction_min(mut self, fraction: f32) -> Self {
        self.charge_fraction_min = fraction;
        self
    }

    /// Validates the configuration.
    ///
    /// The quantizer and the assignment estimate divide by these values, so
    /// non-positive settings are rejected up front.
    pub fn validate(&self) -> Result<()> {
        if self.charge_per_unit <= 0.0 {
            return Err(Error::ConfigError(format!(
                "charge_per_unit must be positive, got {}",
                self.charge_per_unit
            )));
        }
        if self.central_mip_charge <= 0.0 {
            return Err(Error::ConfigError(format!(
                "central_mip_charge must be positive, got {}",
                self.central_mip_charge
            )));
        }
        if self.fractional_width <= 0.0 {
            return Err(Error::ConfigError(format!(
                "fractional_width must be positive, got {}",
                self.fractional_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SplitterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_setters() {
        let config = SplitterConfig::new()
            .with_charge_per_unit(1000.0)
            .with_central_mip_charge(20_000.0)
            .with_fractional_width(0.5)
            .with_forced_errors(50.0, 75.0)
            .with_charge_fraction_min(1.5);

        assert!((config.charge_per_unit - 1000.0).abs() < f32::EPSILON);
        assert!((config.central_mip_charge - 20_000.0).abs() < f32::EPSILON);
        assert!((config.fractional_width - 0.5).abs() < f32::EPSILON);
        assert!((config.force_x_error - 50.0).abs() < f32::EPSILON);
        assert!((config.force_y_error - 75.0).abs() < f32::EPSILON);
        assert!((config.charge_fraction_min - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(SplitterConfig::default()
            .with_charge_per_unit(0.0)
            .validate()
            .is_err());
        assert!(SplitterConfig::default()
            .with_central_mip_charge(-1.0)
            .validate()
            .is_err());
        assert!(SplitterConfig::default()
            .with_fractional_width(0.0)
            .validate()
            .is_err());
    }
}
