//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum TrailmapTypesError {
    /// The operator definition of a CRS was rejected by the projection engine.
    #[error("invalid projection definition '{definition}': {reason}")]
    InvalidDefinition {
        /// Definition string that failed to parse.
        definition: String,
        /// Message reported by the projection engine.
        reason: String,
    },
    /// A coordinate could not be converted (outside of the projection domain).
    #[error("coordinate ({x}, {y}) cannot be projected")]
    Projection {
        /// X coordinate (longitude for geographic input).
        x: f64,
        /// Y coordinate (latitude for geographic input).
        y: f64,
    },
}
