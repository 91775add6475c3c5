//! jetsplit-core: Core types for merged pixel-cluster splitting.
//!
//! This crate provides the data model (pixels, clusters), the splitter
//! configuration, the expected-shape model derived from incidence geometry,
//! and the decision of whether a cluster looks like an unresolved merge.
//!

pub mod config;
pub mod error;
pub mod pixel;
pub mod shape;

pub use config::SplitterConfig;
pub use error::{Error, Result};
pub use pixel::{Pixel, PixelCluster};
pub use shape::{should_split, ExpectedHit, ShapeModel};
