//! Fetching of all the requested layers.

use std::collections::BTreeMap;

use log::info;

use crate::area::ResolvedArea;
use crate::error::{Result, TrailmapError};
use crate::layer::{FeatureLayer, FeatureLayersPayload};
use crate::provider::MapDataProvider;

/// Fetches every layer of a payload from a [`MapDataProvider`], one request per layer.
pub struct FeatureFetcher<'a> {
    provider: &'a dyn MapDataProvider,
}

impl<'a> FeatureFetcher<'a> {
    /// Creates a fetcher using the provider.
    pub fn new(provider: &'a dyn MapDataProvider) -> Self {
        Self { provider }
    }

    /// Fetches all layers, one after another.
    ///
    /// Layers without features are kept as empty layers. The first failing layer aborts the
    /// whole fetch with [`TrailmapError::FeatureFetch`] naming that layer.
    pub fn fetch_all(
        &self,
        area: &ResolvedArea,
        payload: &FeatureLayersPayload,
    ) -> Result<BTreeMap<String, FeatureLayer>> {
        let mut layers = BTreeMap::new();
        for (name, filter) in payload.iter() {
            let features =
                self.provider
                    .fetch(area, filter)
                    .map_err(|source| TrailmapError::FeatureFetch {
                        layer: name.to_string(),
                        source,
                    })?;

            info!("Fetched {} features for layer {name}", features.len());
            layers.insert(name.to_string(), FeatureLayer::new(name, features));
        }

        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::{AreaOfInterest, AreaResolver};
    use crate::error::ProviderError;
    use crate::layer::{Feature, TagFilter, TagValues};
    use crate::provider::Geocoder;
    use assert_matches::assert_matches;
    use geo_types::{point, Geometry};
    use std::cell::RefCell;

    struct NoGeocoder;

    impl Geocoder for NoGeocoder {
        fn geocode(&self, _place: &str) -> std::result::Result<Option<Geometry>, ProviderError> {
            Ok(None)
        }
    }

    /// Returns one point per matching key and records the keys it was asked for.
    #[derive(Default)]
    struct RecordingProvider {
        requests: RefCell<Vec<String>>,
        failing_key: Option<&'static str>,
    }

    impl MapDataProvider for RecordingProvider {
        fn fetch(
            &self,
            _area: &ResolvedArea,
            filter: &TagFilter,
        ) -> std::result::Result<Vec<Feature>, ProviderError> {
            let keys: Vec<_> = filter.iter().map(|(key, _)| key.to_string()).collect();
            self.requests.borrow_mut().push(keys.join(","));

            if keys.iter().any(|key| Some(key.as_str()) == self.failing_key) {
                return Err(ProviderError::Status(504));
            }

            if keys.iter().any(|key| key == "building") {
                return Ok(vec![]);
            }

            Ok(keys
                .into_iter()
                .map(|key| {
                    Feature::new(
                        format!("node/{key}"),
                        Default::default(),
                        point!(x: -107.85, y: 37.3).into(),
                    )
                })
                .collect())
        }
    }

    fn area() -> ResolvedArea {
        AreaResolver::new(&NoGeocoder)
            .resolve(&AreaOfInterest::bbox(37.335, 37.25, -107.81, -107.915).unwrap())
            .unwrap()
    }

    fn payload() -> FeatureLayersPayload {
        FeatureLayersPayload::new()
            .with_layer(
                "trails",
                TagFilter::new().with("highway", TagValues::one_of(["path"])),
            )
            .with_layer("buildings", TagFilter::new().with("building", TagValues::Any))
    }

    #[test]
    fn one_request_per_layer() {
        let provider = RecordingProvider::default();
        let layers = FeatureFetcher::new(&provider)
            .fetch_all(&area(), &payload())
            .unwrap();

        assert_eq!(provider.requests.borrow().len(), 2);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers["trails"].len(), 1);
        assert!(layers["buildings"].is_empty());
        assert_eq!(layers["buildings"].name(), "buildings");
    }

    #[test]
    fn failure_names_the_layer() {
        let provider = RecordingProvider {
            failing_key: Some("building"),
            ..Default::default()
        };

        let result = FeatureFetcher::new(&provider).fetch_all(&area(), &payload());
        assert_matches!(
            result,
            Err(TrailmapError::FeatureFetch { layer, source: ProviderError::Status(504) })
                if layer == "buildings"
        );
    }
}
