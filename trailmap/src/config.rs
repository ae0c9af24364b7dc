//! Run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailmapError};

/// Settings of a trail mileage map run.
///
/// Every field has a default, so a configuration file only needs to list what it changes:
///
/// ```json
/// {"output_dir": "maps", "image_width": 1600}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Overpass API interpreter endpoint.
    pub overpass_url: String,
    /// Nominatim base url.
    pub nominatim_url: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Client side timeout of a request. No timeout if not set.
    pub request_timeout_secs: Option<u64>,
    /// Server side timeout of an Overpass query.
    pub overpass_timeout_secs: u64,
    /// Directory the figures are written to.
    pub output_dir: PathBuf,
    /// Name of the layer whose lines are measured.
    pub trail_layer: String,
    /// Keep only unpaved paths and footways in the trail layer.
    pub filter_trails: bool,
    /// Clip all layers to the area of interest.
    pub clip_to_area: bool,
    /// Figure width in pixels.
    pub image_width: u32,
    /// Figure height in pixels.
    pub image_height: u32,
    /// Projection catalog to use instead of the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Maximum number of vertices of a polygon in a map data query.
    pub max_query_vertices: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("trailmap/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: None,
            overpass_timeout_secs: 180,
            output_dir: PathBuf::from("trail-mileage-maps"),
            trail_layer: "trails".to_string(),
            filter_trails: true,
            clip_to_area: true,
            image_width: 1200,
            image_height: 800,
            catalog_path: None,
            max_query_vertices: 500,
        }
    }
}

impl Config {
    /// Parses the configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| TrailmapError::Configuration(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(TrailmapError::Configuration(format!(
                "image size must not be zero, got {}x{}",
                self.image_width, self.image_height
            )));
        }

        if self.trail_layer.is_empty() {
            return Err(TrailmapError::Configuration(
                "trail layer name must not be empty".to_string(),
            ));
        }

        if self.max_query_vertices < 4 {
            return Err(TrailmapError::Configuration(format!(
                "max_query_vertices must be at least 4, got {}",
                self.max_query_vertices
            )));
        }

        Ok(())
    }
}
