//! Error types for jetsplit-core.

use thiserror::Error;

/// Result type alias for jetsplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for jetsplit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Expected single-hit charge must be strictly positive.
    #[error("expected charge must be positive, got {0}")]
    NonPositiveExpectedCharge(f32),

    /// Expected footprint sizes are floored at one pixel by the caller.
    #[error("expected {axis} size must be at least 1 pixel, got {value}")]
    ExpectedSizeBelowOne {
        /// Axis name ("x" or "y").
        axis: &'static str,
        /// Offending value.
        value: f32,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}
