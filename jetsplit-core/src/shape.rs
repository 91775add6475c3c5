//! Expected hit shape and charge model, plus the splitting decision.
//!
//! A single unmerged hit leaves a footprint whose size and charge depend on
//! the incidence angle of the trajectory in the sensor's local frame. The
//! model here turns the local tangent angles of a reference direction into
//! expected size and charge numbers; the decision compares a measured
//! cluster against them.
#![allow(clippy::cast_precision_loss)]

use crate::error::{Error, Result};
use crate::pixel::PixelCluster;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Angle-dependent model of the expected single-hit footprint.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeModel {
    /// Expected x size at Lorentz-angle incidence, in pixels.
    pub exp_size_x_at_lorentz_incidence: f32,
    /// Growth of the expected x size per unit of tangent angle away from the
    /// Lorentz angle.
    pub exp_size_x_delta_per_tan_alpha: f32,
    /// Expected y size at normal incidence, in pixels.
    pub exp_size_y_at_normal_incidence: f32,
    /// Tangent of the Lorentz drift angle for the sensor.
    pub tan_lorentz_angle: f32,
}

impl Default for ShapeModel {
    fn default() -> Self {
        Self {
            exp_size_x_at_lorentz_incidence: 1.5,
            exp_size_x_delta_per_tan_alpha: 0.0,
            exp_size_y_at_normal_incidence: 1.3,
            tan_lorentz_angle: 0.0,
        }
    }
}

impl ShapeModel {
    /// Expected x footprint of a single hit, floored at one pixel.
    pub fn expected_size_x(&self, tan_alpha: f32) -> f32 {
        let size = self.exp_size_x_at_lorentz_incidence
            + (self.exp_size_x_delta_per_tan_alpha * (tan_alpha - self.tan_lorentz_angle)).abs();
        size.max(1.0)
    }

    /// Expected y footprint of a single hit, floored at one pixel.
    ///
    /// `thickness_over_pitch` is the sensor thickness divided by the pixel
    /// pitch along y, so the product with `tan_beta` is the traversal length
    /// in pixel units.
    pub fn expected_size_y(&self, tan_beta: f32, thickness_over_pitch: f32) -> f32 {
        let normal = self.exp_size_y_at_normal_incidence;
        let slanted = thickness_over_pitch * tan_beta;
        (normal * normal + slanted * slanted).sqrt().max(1.0)
    }

    /// Expected single-hit charge at the given incidence.
    ///
    /// `z_over_rho` is the tangent-angle magnitude of the reference
    /// direction; the path length through the sensor grows with it.
    pub fn expected_charge(&self, z_over_rho: f32, central_mip_charge: f32) -> f32 {
        (1.08 + z_over_rho * z_over_rho).sqrt() * central_mip_charge
    }
}

/// Expected properties of one unmerged hit, as handed to the splitter.
///
/// Construction validates the caller contract: positive charge, sizes of at
/// least one pixel. Division by these values happens throughout the
/// assignment engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExpectedHit {
    charge: f32,
    size_x: f32,
    size_y: f32,
}

impl ExpectedHit {
    /// Creates a validated expectation bundle.
    pub fn new(charge: f32, size_x: f32, size_y: f32) -> Result<Self> {
        if charge.is_nan() || charge <= 0.0 {
            return Err(Error::NonPositiveExpectedCharge(charge));
        }
        if size_x.is_nan() || size_x < 1.0 {
            return Err(Error::ExpectedSizeBelowOne {
                axis: "x",
                value: size_x,
            });
        }
        if size_y.is_nan() || size_y < 1.0 {
            return Err(Error::ExpectedSizeBelowOne {
                axis: "y",
                value: size_y,
            });
        }
        Ok(Self {
            charge,
            size_x,
            size_y,
        })
    }

    /// Expected single-hit charge.
    #[inline]
    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// Expected single-hit x footprint.
    #[inline]
    pub fn size_x(&self) -> f32 {
        self.size_x
    }

    /// Expected single-hit y footprint.
    #[inline]
    pub fn size_y(&self) -> f32 {
        self.size_y
    }
}

/// Decides whether a cluster looks like an unresolved merge of several hits.
///
/// True when the measured charge exceeds the expectation by the configured
/// fraction and the footprint overflows the expected one by more than a
/// pixel along at least one axis. Purely advisory; the caller may evaluate
/// it once per qualifying nearby reference direction.
pub fn should_split(
    cluster: &PixelCluster,
    expected: &ExpectedHit,
    charge_fraction_min: f32,
) -> bool {
    let charge = cluster.charge() as f32;
    charge > expected.charge() * charge_fraction_min
        && (f32::from(cluster.size_x()) > expected.size_x() + 1.0
            || f32::from(cluster.size_y()) > expected.size_y() + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;
    use approx::assert_relative_eq;

    #[test]
    fn test_expected_charge_at_normal_incidence() {
        let model = ShapeModel::default();
        assert_relative_eq!(
            model.expected_charge(0.0, 26_000.0),
            26_000.0 * 1.08_f32.sqrt(),
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_expected_sizes_floored_at_one() {
        let model = ShapeModel {
            exp_size_x_at_lorentz_incidence: 0.3,
            exp_size_y_at_normal_incidence: 0.2,
            ..ShapeModel::default()
        };
        assert_relative_eq!(model.expected_size_x(0.0), 1.0);
        assert_relative_eq!(model.expected_size_y(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_expected_size_y_grows_with_angle() {
        let model = ShapeModel::default();
        let normal = model.expected_size_y(0.0, 2.0);
        let slanted = model.expected_size_y(1.5, 2.0);
        assert!(slanted > normal);
        assert_relative_eq!(
            slanted,
            (1.3_f32 * 1.3 + 3.0 * 3.0).sqrt(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_expectation_validation() {
        assert!(ExpectedHit::new(26_000.0, 1.5, 1.3).is_ok());
        assert!(ExpectedHit::new(0.0, 1.5, 1.3).is_err());
        assert!(ExpectedHit::new(-5.0, 1.5, 1.3).is_err());
        assert!(ExpectedHit::new(26_000.0, 0.5, 1.3).is_err());
        assert!(ExpectedHit::new(26_000.0, 1.5, f32::NAN).is_err());
    }

    #[test]
    fn test_decision_on_oversized_overcharged_cluster() {
        // 8 pixels wide, charge well above 2x the expectation.
        let cluster: PixelCluster = (0..8).map(|i| Pixel::new(i, 4, 10_000)).collect();
        let expected = ExpectedHit::new(26_000.0, 1.5, 1.3).unwrap();
        assert!(should_split(&cluster, &expected, 2.0));
    }

    #[test]
    fn test_decision_false_for_single_hit_cluster() {
        // Charge and size both compatible with one hit.
        let cluster: PixelCluster =
            vec![Pixel::new(3, 4, 14_000), Pixel::new(4, 4, 12_000)].into();
        let expected = ExpectedHit::new(26_000.0, 1.5, 1.3).unwrap();
        assert!(!should_split(&cluster, &expected, 2.0));
    }

    #[test]
    fn test_decision_needs_size_overflow_too() {
        // Charge is high but the footprint matches one hit.
        let cluster: PixelCluster =
            vec![Pixel::new(3, 4, 60_000), Pixel::new(4, 4, 60_000)].into();
        let expected = ExpectedHit::new(26_000.0, 1.5, 1.3).unwrap();
        assert!(!should_split(&cluster, &expected, 2.0));
    }
}
