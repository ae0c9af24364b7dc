//! Catalog of projected coordinate systems and the areas they are accurate in.

use std::path::Path;

use geo::Intersects;
use geo_types::{Coord, Geometry, MultiPolygon, Point};
use geojson::{FeatureCollection, GeoJson};
use log::{info, warn};
use trailmap_types::geo::Crs;

use crate::error::{Result, TrailmapError};

const BUILTIN_CATALOG: &str = include_str!("../resources/projections.geojson");

/// One projected coordinate system of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    crs: Crs,
    name: String,
    coverage: MultiPolygon,
}

impl CatalogEntry {
    /// Creates an entry. Coverage is given in geographic coordinates.
    pub fn new(crs: Crs, name: impl Into<String>, coverage: MultiPolygon) -> Self {
        Self {
            crs,
            name: name.into(),
            coverage,
        }
    }

    /// The coordinate system.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Human readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Area in which the system is used.
    pub fn coverage(&self) -> &MultiPolygon {
        &self.coverage
    }

    /// Checks if the point lies inside of the coverage or on its boundary.
    pub fn covers(&self, point: &Point) -> bool {
        self.coverage.intersects(point)
    }
}

/// Ordered list of projections with a fallback for points not covered by any of them.
///
/// Entries are matched in order, so more specific (smaller) coverages must come before
/// the ones they overlap with.
#[derive(Debug, Clone)]
pub struct ProjectionCatalog {
    entries: Vec<CatalogEntry>,
    default: Crs,
}

impl ProjectionCatalog {
    /// Creates a catalog from entries in matching order. The default is World Mercator.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            default: Crs::EPSG3395,
        }
    }

    /// Catalog shipped with the crate: Colorado State Plane zones followed by the WGS 84 UTM
    /// zones.
    pub fn builtin() -> Result<Self> {
        Self::from_geojson_str(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a GeoJSON file, see [`ProjectionCatalog::from_geojson_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&json)
    }

    /// Parses a catalog from a GeoJSON feature collection.
    ///
    /// Every feature must have a `code` and a `definition` property and a polygonal geometry.
    /// The `name` property is optional. Definitions are validated when loading.
    pub fn from_geojson_str(json: &str) -> Result<Self> {
        let geojson: GeoJson = json
            .parse()
            .map_err(|err: geojson::Error| TrailmapError::Catalog(err.to_string()))?;
        let collection = FeatureCollection::try_from(geojson)
            .map_err(|err| TrailmapError::Catalog(err.to_string()))?;

        let entries = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| -> Result<CatalogEntry> {
                let property = |key: &str| {
                    feature
                        .property(key)
                        .and_then(|value| value.as_str())
                        .map(str::to_string)
                };

                let code = property("code").ok_or_else(|| {
                    TrailmapError::Catalog(format!("record {index} has no 'code' property"))
                })?;
                let definition = property("definition").ok_or_else(|| {
                    TrailmapError::Catalog(format!("record {code} has no 'definition' property"))
                })?;
                let name = property("name").unwrap_or_else(|| code.clone());

                let geometry = feature.geometry.clone().ok_or_else(|| {
                    TrailmapError::Catalog(format!("record {code} has no coverage"))
                })?;
                let coverage = match Geometry::<f64>::try_from(geometry) {
                    Ok(Geometry::Polygon(polygon)) => MultiPolygon::new(vec![polygon]),
                    Ok(Geometry::MultiPolygon(polygons)) => polygons,
                    Ok(_) => {
                        return Err(TrailmapError::Catalog(format!(
                            "coverage of record {code} is not a polygon"
                        )))
                    }
                    Err(err) => return Err(TrailmapError::Catalog(format!("{code}: {err}"))),
                };

                let crs = Crs::new(code, definition);
                crs.get_projection::<Coord, Coord>()
                    .map_err(|err| TrailmapError::Catalog(err.to_string()))?;

                Ok(CatalogEntry::new(crs, name, coverage))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(entries))
    }

    /// Replaces the fallback coordinate system.
    pub fn with_default(mut self, default: Crs) -> Self {
        self.default = default;
        self
    }

    /// Entries in matching order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Fallback coordinate system.
    pub fn default_crs(&self) -> &Crs {
        &self.default
    }

    /// First entry covering the point, if any.
    pub fn find(&self, point: &Point) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.covers(point))
    }

    /// Coordinate system to measure lengths around the point in.
    ///
    /// Falls back to the default system (with a warning) if no entry covers the point. With the
    /// default Mercator fallback, measured lengths grow with `sec(latitude)`.
    pub fn select(&self, point: &Point) -> &Crs {
        match self.find(point) {
            Some(entry) => {
                info!("Selected projection {} ({})", entry.crs, entry.name);
                &entry.crs
            }
            None => {
                warn!(
                    "No projection in the catalog covers ({:.5}, {:.5}), falling back to {}; \
                     lengths are inflated by the secant of the latitude away from the equator",
                    point.y(),
                    point.x(),
                    self.default
                );
                &self.default
            }
        }
    }
}
