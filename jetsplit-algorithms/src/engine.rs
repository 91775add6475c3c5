//! Iterative soft-assignment engine for splitting a merged cluster.
//!
//! The engine alternates between scoring every sub-pixel against every
//! candidate sub-cluster center and recomputing the centers as
//! charge-weighted centroids of their assigned sub-pixels, until the centers
//! stop moving or the iteration budget runs out. Each iteration is a pure
//! function from the previous center state to the next one; the driving
//! loop owns the convergence check and the budget.
//!
//! All arithmetic is single-precision: scores are close enough that the
//! tie-breaks in the assignment step depend on the exact float width.
#![allow(clippy::cast_precision_loss, clippy::cast_lossless)]

use jetsplit_core::{ExpectedHit, Pixel, PixelCluster, Result, SplitterConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::quantize::{expected_hit_count, merge_subpixels, quantize, SubPixel};
use crate::score::{rank_pixels, RankingPolicy};

/// Iteration budget; exceeding it accepts the last state.
const MAX_ITERATIONS: usize = 100;
/// A center that moved at most this much in both coordinates is considered
/// settled.
const CONVERGENCE_TOLERANCE: f32 = 0.01;
/// Softening added to the distance before inversion, bounding the weight of
/// a sub-pixel sitting exactly on a center.
const DISTANCE_SOFTENING: f32 = 0.05;
/// Floor on the charge weight so a saturated center can still win when every
/// other center is much farther away.
const CHARGE_WEIGHT_FLOOR: f32 = 1e-6;

/// Center positions between iterations. Charges are rebuilt from scratch
/// inside every assignment pass, so only the positions persist.
#[derive(Debug, Clone, PartialEq)]
struct CenterState {
    cx: Vec<f32>,
    cy: Vec<f32>,
}

impl CenterState {
    /// Deterministic seeding: centers on a diagonal starting at the first
    /// pixel, one pixel apart.
    fn seeded(first: Pixel, count: usize) -> Self {
        Self {
            cx: (0..count).map(|i| f32::from(first.x) + i as f32).collect(),
            cy: (0..count).map(|i| f32::from(first.y) + i as f32).collect(),
        }
    }

    /// Largest per-coordinate displacement of any center relative to
    /// `other`.
    fn max_displacement(&self, other: &Self) -> f32 {
        let dx = self
            .cx
            .iter()
            .zip(&other.cx)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        let dy = self
            .cy
            .iter()
            .zip(&other.cy)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        dx.max(dy)
    }
}

/// Piecewise-quadratic distance of a pixel offset from a center, shaped by
/// the expected footprint.
///
/// Inside half the footprint the contribution is `(2*delta/size)^2`, outside
/// it continues as `(|delta| - size/2 + 1)^2`; the two meet at the boundary,
/// so the penalty grows smoothly past the expected extent. The axis
/// contributions combine Euclidean-style.
fn footprint_distance(dx: f32, dy: f32, size_x: f32, size_y: f32) -> f32 {
    let axis = |delta: f32, size: f32| {
        if delta.abs() > size / 2.0 {
            let over = delta.abs() - size / 2.0 + 1.0;
            over * over
        } else {
            let inside = 2.0 * delta / size;
            inside * inside
        }
    };
    (axis(dx, size_x) + axis(dy, size_y)).sqrt()
}

/// Per-call diagnostics of the assignment engine.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitDiagnostics {
    /// Maximum center displacement observed at each iteration.
    pub displacements: Vec<f32>,
    /// Iterations actually run.
    pub iterations: usize,
    /// Whether the centers settled before the budget ran out.
    pub converged: bool,
}

/// Splits merged pixel clusters into the individual hits they contain.
///
/// Holds the validated configuration and the ranking policy; `split` is the
/// per-cluster entry point and may be called from multiple threads, since
/// every call owns its working state.
#[derive(Debug, Clone)]
pub struct ClusterSplitter {
    config: SplitterConfig,
    policy: RankingPolicy,
}

impl ClusterSplitter {
    /// Creates a splitter, validating the configuration.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            policy: RankingPolicy::default(),
        })
    }

    /// Selects the assignment ordering policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Returns the active ranking policy.
    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    /// Splits a cluster into the number of hits estimated from its charge.
    ///
    /// Returns the original cluster unchanged when the estimate is one hit
    /// or fewer; the output pixels always carry exactly the input charge.
    pub fn split(&self, cluster: &PixelCluster, expected: &ExpectedHit) -> Vec<PixelCluster> {
        let count = expected_hit_count(cluster, expected.charge());
        self.split_with_count(cluster, expected, count)
    }

    /// Splits a cluster into an explicit number of sub-clusters.
    ///
    /// A count of one or less is a pass-through, as is an empty cluster.
    /// Centers that end up with no assigned charge produce no output
    /// cluster, so the result may hold fewer than `count` entries.
    pub fn split_with_count(
        &self,
        cluster: &PixelCluster,
        expected: &ExpectedHit,
        count: usize,
    ) -> Vec<PixelCluster> {
        self.split_with_diagnostics(cluster, expected, count).0
    }

    /// As [`split_with_count`](Self::split_with_count), also reporting how
    /// the iteration behaved.
    pub fn split_with_diagnostics(
        &self,
        cluster: &PixelCluster,
        expected: &ExpectedHit,
        count: usize,
    ) -> (Vec<PixelCluster>, SplitDiagnostics) {
        let mut diagnostics = SplitDiagnostics::default();
        if count <= 1 || cluster.is_empty() {
            return (vec![cluster.clone()], diagnostics);
        }

        let subpixels = quantize(cluster, &self.config, expected.charge());
        let first = cluster.pixels()[0];
        let mut state = CenterState::seeded(first, count);
        let mut assignment = vec![None; subpixels.len()];

        for _ in 0..MAX_ITERATIONS {
            let (next, assigned) =
                self.iterate_once(cluster.pixels(), &subpixels, expected, &state);
            assignment = assigned;
            let displacement = state.max_displacement(&next);
            diagnostics.displacements.push(displacement);
            diagnostics.iterations += 1;
            state = next;
            if displacement <= CONVERGENCE_TOLERANCE {
                diagnostics.converged = true;
                break;
            }
        }

        (self.reaggregate(&subpixels, &assignment, count), diagnostics)
    }

    /// One engine iteration: score, rank, assign, recompute centers.
    ///
    /// Pure with respect to `state`; returns the next center positions and
    /// the sub-pixel assignment produced on the way.
    fn iterate_once(
        &self,
        pixels: &[Pixel],
        subpixels: &[SubPixel],
        expected: &ExpectedHit,
        state: &CenterState,
    ) -> (CenterState, Vec<Option<usize>>) {
        let count = state.cx.len();

        let distance_map: Vec<Vec<f32>> = pixels
            .iter()
            .map(|pixel| {
                (0..count)
                    .map(|i| {
                        footprint_distance(
                            f32::from(pixel.x) - state.cx[i],
                            f32::from(pixel.y) - state.cy[i],
                            expected.size_x(),
                            expected.size_y(),
                        )
                    })
                    .collect()
            })
            .collect();

        let order = rank_pixels(self.policy, &distance_map);

        // Greedy assignment with online charge accumulation: a sub-pixel
        // assigned earlier in the pass raises its center's charge penalty
        // for everything assigned after it.
        let mut charges = vec![0.0f32; count];
        let mut assignment = vec![None; subpixels.len()];
        for &pixel_index in &order {
            for (k, sub) in subpixels.iter().enumerate() {
                if sub.source != pixel_index {
                    continue;
                }
                let mut best_est = 0.0f32;
                let mut best_center = None;
                for i in 0..count {
                    let nsig = (charges[i] - expected.charge())
                        / (expected.charge() * self.config.fractional_width);
                    let charge_weight = 1.0 / (1.0 + nsig.exp()) + CHARGE_WEIGHT_FLOOR;
                    let distance_weight =
                        1.0 / (distance_map[pixel_index][i] + DISTANCE_SOFTENING);
                    let est = charge_weight * distance_weight;
                    if est > best_est {
                        best_est = est;
                        best_center = Some(i);
                    }
                }
                if let Some(i) = best_center {
                    charges[i] += sub.adc as f32;
                    assignment[k] = Some(i);
                }
            }
        }

        // Charge-weighted centroids over the source pixel coordinates.
        let mut wx = vec![0.0f32; count];
        let mut wy = vec![0.0f32; count];
        let mut weight = vec![0.0f32; count];
        for (k, sub) in subpixels.iter().enumerate() {
            if let Some(i) = assignment[k] {
                let adc = sub.adc as f32;
                wx[i] += f32::from(sub.x) * adc;
                wy[i] += f32::from(sub.y) * adc;
                weight[i] += adc;
            }
        }
        let next = CenterState {
            cx: (0..count)
                .map(|i| if weight[i] > 0.0 { wx[i] / weight[i] } else { 0.0 })
                .collect(),
            cy: (0..count)
                .map(|i| if weight[i] > 0.0 { wy[i] / weight[i] } else { 0.0 })
                .collect(),
        };

        (next, assignment)
    }

    /// Collapses sub-pixels back to pixel resolution, one output cluster per
    /// center that received charge.
    fn reaggregate(
        &self,
        subpixels: &[SubPixel],
        assignment: &[Option<usize>],
        count: usize,
    ) -> Vec<PixelCluster> {
        let mut output = Vec::new();
        for center in 0..count {
            let assigned: Vec<SubPixel> = subpixels
                .iter()
                .zip(assignment)
                .filter(|(_, a)| **a == Some(center))
                .map(|(sub, _)| *sub)
                .collect();
            let merged = merge_subpixels(&assigned);
            if merged.is_empty() {
                continue;
            }
            let mut piece = PixelCluster::from(merged);
            if self.config.force_x_error > 0.0 {
                piece.set_split_error_x(self.config.force_x_error);
            }
            if self.config.force_y_error > 0.0 {
                piece.set_split_error_y(self.config.force_y_error);
            }
            output.push(piece);
        }
        output
    }
}
