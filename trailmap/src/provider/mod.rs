//! External data collaborators: the geocoder and the map data service.

use geo_types::Geometry;

use crate::area::ResolvedArea;
use crate::error::ProviderError;
use crate::layer::{Feature, TagFilter};

mod nominatim;
mod overpass;

pub use nominatim::NominatimGeocoder;
pub use overpass::OverpassProvider;

/// Resolves place names into boundary geometries.
pub trait Geocoder {
    /// Looks up the boundary of the place.
    ///
    /// Returns `Ok(None)` if the service has no match for the name. The geometry is in
    /// geographic coordinates (`x` = longitude, `y` = latitude).
    fn geocode(&self, place: &str) -> Result<Option<Geometry>, ProviderError>;
}

/// Source of map features.
pub trait MapDataProvider {
    /// Fetches all features inside the area that match the filter.
    ///
    /// An empty result is not an error.
    fn fetch(&self, area: &ResolvedArea, filter: &TagFilter) -> Result<Vec<Feature>, ProviderError>;
}
