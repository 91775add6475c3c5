//! Region-level driving: split attempts, fallback policy, output ordering.
//!
//! The surrounding reconstruction decides which clusters sit near which
//! high-momentum reference directions and precomputes one expectation
//! bundle per qualifying direction. This module runs the decision and the
//! splitter over those attempts, applies the failed-split fallback, and
//! orders a region's outputs once at the end.

use jetsplit_core::{should_split, ExpectedHit, PixelCluster};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::ClusterSplitter;

/// Conversion from the pitch unit (centimeters) to the error unit (microns).
const CENTI_TO_MICRO: f32 = 1e4;

/// Pixel pitch of a sensor along both axes, in centimeters.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorPitch {
    /// Pitch along x.
    pub x: f32,
    /// Pitch along y.
    pub y: f32,
}

/// One input cluster plus the expectation of every qualifying nearby
/// reference direction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitAttempt {
    /// The raw cluster.
    pub cluster: PixelCluster,
    /// Expected single-hit properties, one entry per reference direction.
    pub expectations: Vec<ExpectedHit>,
}

/// Runs every attempt on one cluster and applies the fallback policy.
///
/// Each expectation that passes the splitting decision triggers its own
/// split call, so a cluster near several reference directions can
/// contribute several sets of output. If the decision fired at least once
/// but no call produced output, the original cluster is kept with its
/// position errors inflated in proportion to its extent, signaling reduced
/// confidence without dropping the data. A cluster that never qualified is
/// passed through untouched.
pub fn process_cluster(
    splitter: &ClusterSplitter,
    attempt: &SplitAttempt,
    pitch: SensorPitch,
) -> Vec<PixelCluster> {
    let fraction_min = splitter.config().charge_fraction_min;
    let mut output = Vec::new();
    let mut was_candidate = false;
    let mut was_split = false;

    for expected in &attempt.expectations {
        if !should_split(&attempt.cluster, expected, fraction_min) {
            continue;
        }
        was_candidate = true;
        let pieces = splitter.split(&attempt.cluster, expected);
        if !pieces.is_empty() {
            was_split = true;
            output.extend(pieces);
        }
    }

    if !was_split {
        let mut kept = attempt.cluster.clone();
        if was_candidate {
            inflate_split_errors(&mut kept, pitch);
        }
        output.push(kept);
    }

    output
}

/// Fallback error inflation for a candidate that could not be split.
///
/// The position errors grow with the cluster's pixel extent and the sensor
/// pitch, converted to microns.
pub fn inflate_split_errors(cluster: &mut PixelCluster, pitch: SensorPitch) {
    cluster.set_split_error_x(f32::from(cluster.size_x()) * pitch.x * CENTI_TO_MICRO / 3.0);
    cluster.set_split_error_y(f32::from(cluster.size_y()) * pitch.y * CENTI_TO_MICRO / 3.0);
}

/// Processes every attempt in a detector region and sorts the collected
/// outputs once, ascending by minimum pixel row.
pub fn process_region(
    splitter: &ClusterSplitter,
    attempts: &[SplitAttempt],
    pitch: SensorPitch,
) -> Vec<PixelCluster> {
    let mut output: Vec<PixelCluster> = attempts
        .iter()
        .flat_map(|attempt| process_cluster(splitter, attempt, pitch))
        .collect();
    output.sort_by_key(|cluster| cluster.min_pixel_row().unwrap_or(0));
    output
}

/// Processes detector regions in parallel.
///
/// Regions are fully independent, so the fan-out shares nothing but the
/// splitter configuration. Output order follows the input region order.
pub fn process_regions_parallel(
    splitter: &ClusterSplitter,
    regions: &[(Vec<SplitAttempt>, SensorPitch)],
) -> Vec<Vec<PixelCluster>> {
    regions
        .par_iter()
        .map(|(attempts, pitch)| process_region(splitter, attempts, *pitch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use jetsplit_core::{Pixel, SplitterConfig};

    const PITCH: SensorPitch = SensorPitch {
        x: 0.01,
        y: 0.015,
    };

    fn splitter() -> ClusterSplitter {
        ClusterSplitter::new(SplitterConfig::default()).unwrap()
    }

    fn expectation() -> ExpectedHit {
        ExpectedHit::new(26_000.0 * 1.08_f32.sqrt(), 1.5, 1.3).unwrap()
    }

    #[test]
    fn test_non_candidate_passes_through() {
        let cluster: PixelCluster =
            vec![Pixel::new(3, 4, 14_000), Pixel::new(4, 4, 12_000)].into();
        let attempt = SplitAttempt {
            cluster: cluster.clone(),
            expectations: vec![expectation()],
        };

        let out = process_cluster(&splitter(), &attempt, PITCH);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], cluster);
        assert_eq!(out[0].split_error_x(), None);
    }

    #[test]
    fn test_candidate_gets_split() {
        let cluster: PixelCluster = (0..10).map(|i| Pixel::new(i, 3, 11_000)).collect();
        let attempt = SplitAttempt {
            cluster,
            expectations: vec![expectation()],
        };

        let out = process_cluster(&splitter(), &attempt, PITCH);
        assert!(out.len() >= 2);
        for piece in &out {
            assert_eq!(piece.split_error_x(), Some(100.0));
        }
    }

    #[test]
    fn test_no_expectations_keeps_cluster_unchanged() {
        let cluster: PixelCluster = (0..10).map(|i| Pixel::new(i, 3, 11_000)).collect();
        let attempt = SplitAttempt {
            cluster: cluster.clone(),
            expectations: Vec::new(),
        };

        let out = process_cluster(&splitter(), &attempt, PITCH);
        assert_eq!(out, vec![cluster]);
    }

    #[test]
    fn test_fallback_inflates_errors_by_extent() {
        let mut cluster: PixelCluster = (0..10).map(|i| Pixel::new(i, 3, 11_000)).collect();
        inflate_split_errors(&mut cluster, PITCH);

        // size_x = 10, pitch 0.01 cm -> 10 * 0.01 * 1e4 / 3 microns.
        assert_relative_eq!(
            cluster.split_error_x().unwrap(),
            10.0 * 0.01 * 1e4 / 3.0,
            epsilon = 1e-3
        );
        // size_y = 1, pitch 0.015 cm.
        assert_relative_eq!(
            cluster.split_error_y().unwrap(),
            1.0 * 0.015 * 1e4 / 3.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_region_output_sorted_by_min_row() {
        let high: PixelCluster = vec![Pixel::new(0, 40, 10_000)].into();
        let low: PixelCluster = vec![Pixel::new(0, 5, 10_000)].into();
        let attempts = vec![
            SplitAttempt {
                cluster: high,
                expectations: vec![expectation()],
            },
            SplitAttempt {
                cluster: low,
                expectations: vec![expectation()],
            },
        ];

        let out = process_region(&splitter(), &attempts, PITCH);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].min_pixel_row(), Some(5));
        assert_eq!(out[1].min_pixel_row(), Some(40));
    }

    #[test]
    fn test_parallel_regions_match_sequential() {
        let make_region = |row: u16| {
            vec![SplitAttempt {
                cluster: (0..10).map(|i| Pixel::new(i, row, 11_000)).collect(),
                expectations: vec![expectation()],
            }]
        };
        let regions: Vec<_> = (0..4)
            .map(|r| (make_region(r * 10), PITCH))
            .collect();

        let splitter = splitter();
        let parallel = process_regions_parallel(&splitter, &regions);
        for (result, (attempts, pitch)) in parallel.iter().zip(&regions) {
            assert_eq!(result, &process_region(&splitter, attempts, *pitch));
        }
    }
}
