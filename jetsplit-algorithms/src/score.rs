//! Ranking policies for assignment ordering.
//!
//! Each iteration assigns pixels to centers in an explicit order: pixels
//! whose best center is clearly better than the runner-up are resolved
//! first, so ambiguous pixels see charge totals already shaped by the easy
//! decisions.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Best and second-best values in one pixel's row of center distances.
///
/// Returns `f32::MAX` for a slot that has no candidate (fewer than one or
/// two centers).
pub fn closest_pair(distances: &[f32]) -> (f32, f32) {
    let mut best = f32::MAX;
    let mut second = f32::MAX;
    for &dist in distances {
        if dist < best {
            second = best;
            best = dist;
        } else if dist < second {
            second = dist;
        }
    }
    (best, second)
}

/// Strategy for ordering pixels within one assignment pass.
///
/// All variants process in descending score, i.e. least ambiguous first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RankingPolicy {
    /// Gap between the second-best and best center distance. The default:
    /// pixels with a clear winner are resolved before contested ones.
    #[default]
    SeparationGap,
    /// Raw second-best distance: pixels whose runner-up center is far away
    /// go first.
    SecondDistance,
    /// Raw best distance: pixels far from every center go first.
    BestDistance,
}

impl RankingPolicy {
    fn score(self, distances: &[f32]) -> f32 {
        let (best, second) = closest_pair(distances);
        match self {
            Self::SeparationGap => second - best,
            Self::SecondDistance => second,
            Self::BestDistance => best,
        }
    }
}

/// Orders pixel indices by descending policy score.
///
/// `distance_map` holds one row per original pixel with the distance to
/// every center. The sort is stable, so tied pixels keep their input order.
pub fn rank_pixels(policy: RankingPolicy, distance_map: &[Vec<f32>]) -> Vec<usize> {
    let mut scored: Vec<(f32, usize)> = distance_map
        .iter()
        .enumerate()
        .map(|(j, row)| (policy.score(row), j))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, j)| j).collect()
}
