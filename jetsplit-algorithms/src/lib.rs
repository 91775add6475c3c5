//! jetsplit-algorithms: Charge quantization and iterative sub-cluster
//! assignment for merged pixel clusters.
//!
//! The pipeline per cluster:
//! 1. quantize pixel charge into bounded sub-units ([`quantize`])
//! 2. iteratively assign sub-units to candidate centers ([`ClusterSplitter`])
//! 3. reaggregate assignments into pixel-resolution output clusters
//!
//! [`region`] adds the caller-side layer: running split attempts over a
//! detector region, the failed-split fallback, output ordering, and a
//! parallel fan-out across regions.
//!
#![warn(missing_docs)]

mod engine;
mod quantize;
mod score;
pub mod region;

pub use engine::{ClusterSplitter, SplitDiagnostics};
pub use quantize::{expected_hit_count, merge_subpixels, quantize, SubPixel};
pub use region::{
    inflate_split_errors, process_cluster, process_region, process_regions_parallel, SensorPitch,
    SplitAttempt,
};
pub use score::{closest_pair, rank_pixels, RankingPolicy};

// Re-export the core types the public API is built from
pub use jetsplit_core::{
    should_split, Error, ExpectedHit, Pixel, PixelCluster, Result, ShapeModel, SplitterConfig,
};
