//! Place name lookup through a [Nominatim](https://nominatim.org) instance.

use geo_types::Geometry;
use geojson::GeoJson;
use log::debug;
use reqwest::blocking::Client;

use crate::error::ProviderError;
use crate::provider::Geocoder;

/// Number of candidates requested per lookup. The first polygonal one is used.
const SEARCH_LIMIT: &str = "50";

/// Geocoder returning the boundary polygon of the best polygonal match.
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    /// Creates a geocoder for the service at the given base url.
    ///
    /// Public Nominatim instances reject requests without an identifying user agent, so the
    /// client should be configured with one.
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.url.trim_end_matches('/'))
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, place: &str) -> Result<Option<Geometry>, ProviderError> {
        let url = self.search_url();
        debug!("Geocoding '{place}' with {url}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", place),
                ("format", "geojson"),
                ("polygon_geojson", "1"),
                ("limit", SEARCH_LIMIT),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        parse_search_result(&response.text()?)
    }
}

fn parse_search_result(body: &str) -> Result<Option<Geometry>, ProviderError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|err: geojson::Error| ProviderError::Decoding(err.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(ProviderError::Decoding(
            "expected a feature collection".to_string(),
        ));
    };

    for feature in collection.features {
        let Some(geometry) = feature.geometry else {
            continue;
        };

        let geometry = Geometry::try_from(geometry)
            .map_err(|err| ProviderError::Decoding(err.to_string()))?;
        match geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => return Ok(Some(geometry)),
            other => debug!("Skipping non-polygonal geocoding candidate: {other:?}"),
        }
    }

    Ok(None)
}
