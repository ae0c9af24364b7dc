//! Error types used by the crate.

use thiserror::Error;
use trailmap_types::error::TrailmapTypesError;

/// Trailmap error type.
///
/// Every variant aborts the run: there is no partial result, either the whole pipeline completes
/// or the first error is returned to the caller.
#[derive(Debug, Error)]
pub enum TrailmapError {
    /// Place name lookup returned no usable boundary.
    #[error("area '{place}' not found: {reason}")]
    AreaNotFound {
        /// Place name as given by the caller.
        place: String,
        /// Why the lookup result was rejected.
        reason: String,
    },
    /// Malformed bounding box.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    /// The geocoding service failed.
    #[error("failed to geocode '{place}'")]
    Geocoding {
        /// Place name as given by the caller.
        place: String,
        /// Provider failure.
        #[source]
        source: ProviderError,
    },
    /// One of the requested feature layers could not be fetched.
    #[error("failed to fetch features for layer '{layer}'")]
    FeatureFetch {
        /// Name of the layer that failed.
        layer: String,
        /// Provider failure.
        #[source]
        source: ProviderError,
    },
    /// Projection catalog could not be loaded.
    #[error("invalid projection catalog: {0}")]
    Catalog(String),
    /// Coordinate conversion failed.
    #[error("projection error: {0}")]
    Projection(#[from] TrailmapTypesError),
    /// Invalid configuration or feature layers payload.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Error reading/writing data to the FS.
    #[error("failed to read or write file: {0}")]
    FsIo(#[from] std::io::Error),
}

/// Failure of an external data provider (geocoder or map data service).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport level error.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-success HTTP status.
    #[error("provider returned HTTP status {0}")]
    Status(u16),
    /// Response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decoding(String),
    /// Provider reported an error inside of an otherwise successful response.
    #[error("provider error: {0}")]
    Remote(String),
    /// Tag filter cannot be turned into a query.
    #[error("invalid tag filter: {0}")]
    InvalidFilter(String),
}

/// Result type of the crate.
pub type Result<T> = std::result::Result<T, TrailmapError>;
