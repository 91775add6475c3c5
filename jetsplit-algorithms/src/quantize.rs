//! Charge quantization: expanding pixels into bounded-charge sub-units.
//!
//! The assignment engine works on charge units small enough that a few
//! very-high-charge pixels cannot dominate the scores. Each pixel is
//! expanded into one or more sub-pixels at the same location, splitting its
//! ADC reading exactly.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use jetsplit_core::{Pixel, PixelCluster, SplitterConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A fractional-charge unit derived from exactly one source pixel.
///
/// Multiple sub-pixels may share the same (x, y); `source` indexes the
/// originating pixel within the input cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubPixel {
    /// Index of the originating pixel in the input cluster.
    pub source: usize,
    /// X coordinate (column) of the source pixel.
    pub x: u16,
    /// Y coordinate (row) of the source pixel.
    pub y: u16,
    /// Charge share of this unit.
    pub adc: u32,
}

/// Expected number of merged hits in a cluster.
///
/// Total charge over expected single-hit charge, rounded to nearest. A
/// result of one or less means the cluster is consistent with a single hit
/// and splitting is a pass-through.
pub fn expected_hit_count(cluster: &PixelCluster, expected_charge: f32) -> usize {
    let n = (cluster.charge() as f32 / expected_charge + 0.5).floor();
    if n.is_sign_negative() {
        0
    } else {
        n as usize
    }
}

/// Expands every pixel of a cluster into sub-pixels of bounded charge.
///
/// The unit count per pixel scales with its charge relative to
/// `charge_per_unit`, corrected by the ratio of the expected charge to the
/// nominal single-hit charge, and is floored at one. The pixel's ADC is
/// divided evenly with the last sub-pixel absorbing the rounding remainder,
/// so charge is conserved exactly per pixel.
pub fn quantize(
    cluster: &PixelCluster,
    config: &SplitterConfig,
    expected_charge: f32,
) -> Vec<SubPixel> {
    let mut subpixels = Vec::with_capacity(cluster.len());
    for (source, pixel) in cluster.pixels().iter().enumerate() {
        let units = (pixel.adc as f32 / config.charge_per_unit * expected_charge
            / config.central_mip_charge) as u32;
        let units = units.max(1);
        let per_unit = pixel.adc / units;
        for k in 0..units {
            let adc = if k == units - 1 {
                pixel.adc - per_unit * k
            } else {
                per_unit
            };
            subpixels.push(SubPixel {
                source,
                x: pixel.x,
                y: pixel.y,
                adc,
            });
        }
    }
    subpixels
}

/// Merges sub-pixels sharing an (x, y) identity by summing their charge.
///
/// Zero-charge entries are dropped; surviving pixels keep the order of
/// their first occurrence. The merged content does not depend on the input
/// order, only the output ordering does.
pub fn merge_subpixels(subpixels: &[SubPixel]) -> Vec<Pixel> {
    let mut merged: Vec<Pixel> = Vec::new();
    for sub in subpixels {
        if sub.adc == 0 {
            continue;
        }
        if let Some(existing) = merged.iter_mut().find(|p| p.x == sub.x && p.y == sub.y) {
            existing.adc += sub.adc;
        } else {
            merged.push(Pixel::new(sub.x, sub.y, sub.adc));
        }
    }
    merged
}
