use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use assert_matches::assert_matches;
use geo::EuclideanLength;
use geo_types::{polygon, Coord, Geometry, LineString};
use trailmap::area::ResolvedArea;
use trailmap::catalog::ProjectionCatalog;
use trailmap::error::ProviderError;
use trailmap::layer::{Feature, TagFilter, TagValues};
use trailmap::provider::{Geocoder, MapDataProvider};
use trailmap::trailmap_types::geo::{Crs, Projection};
use trailmap::trailmap_types::Reproject;
use trailmap::{AreaOfInterest, Config, FeatureLayersPayload, TrailMileageMapBuilder, TrailmapError};

const DURANGO: [f64; 4] = [37.335, 37.25, -107.81, -107.915];

/// Serves features from an in-memory pool and records every request.
#[derive(Clone, Default)]
struct PoolProvider {
    features: Vec<Feature>,
    failing_key: Option<&'static str>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl PoolProvider {
    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl MapDataProvider for PoolProvider {
    fn fetch(&self, _area: &ResolvedArea, filter: &TagFilter) -> Result<Vec<Feature>, ProviderError> {
        let keys: Vec<_> = filter.iter().map(|(key, _)| key.to_string()).collect();
        self.requests.lock().unwrap().push(keys.join(","));

        if keys.iter().any(|key| Some(key.as_str()) == self.failing_key) {
            return Err(ProviderError::Remote("runtime error: out of memory".into()));
        }

        Ok(self
            .features
            .iter()
            .filter(|feature| filter.matches(feature.tags()))
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
struct FixedGeocoder {
    boundary: Option<Geometry>,
    requests: Arc<Mutex<usize>>,
}

impl Geocoder for FixedGeocoder {
    fn geocode(&self, _place: &str) -> Result<Option<Geometry>, ProviderError> {
        *self.requests.lock().unwrap() += 1;
        Ok(self.boundary.clone())
    }
}

fn colorado_south() -> Crs {
    ProjectionCatalog::builtin()
        .unwrap()
        .entries()
        .iter()
        .find(|entry| entry.crs().code() == "EPSG:2774")
        .unwrap()
        .crs()
        .clone()
}

/// Straight line of the given length in the Colorado South projection, in geographic coordinates.
fn trail(from: Coord, meters: f64) -> LineString {
    let projection = colorado_south().get_projection::<Coord, Coord>().unwrap();
    let start = projection.project(&from).unwrap();
    let end = Coord {
        x: start.x,
        y: start.y + meters,
    };
    LineString::new(vec![start, end])
        .unproject(&projection)
        .unwrap()
}

fn feature(id: &str, tags: &[(&str, &str)], geometry: impl Into<Geometry>) -> Feature {
    let tags: BTreeMap<_, _> = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Feature::new(id, tags, geometry.into())
}

fn pool() -> Vec<Feature> {
    vec![
        feature(
            "way/1",
            &[("highway", "path")],
            trail(Coord { x: -107.88, y: 37.28 }, 500.0),
        ),
        feature(
            "way/2",
            &[("highway", "path"), ("surface", "dirt")],
            trail(Coord { x: -107.85, y: 37.27 }, 1200.0),
        ),
        feature(
            "way/3",
            &[("highway", "footway"), ("surface", "asphalt")],
            trail(Coord { x: -107.86, y: 37.3 }, 300.0),
        ),
        feature(
            "way/4",
            &[("highway", "primary")],
            LineString::from(vec![(-107.91, 37.262), (-107.82, 37.32)]),
        ),
        feature(
            "way/5",
            &[("building", "yes")],
            geo_types::polygon![
                (x: -107.87, y: 37.29),
                (x: -107.869, y: 37.29),
                (x: -107.869, y: 37.291),
                (x: -107.87, y: 37.291),
            ],
        ),
    ]
}

fn payload() -> FeatureLayersPayload {
    FeatureLayersPayload::new()
        .with_layer(
            "trails",
            TagFilter::new().with("highway", TagValues::one_of(["path", "footway"])),
        )
        .with_layer(
            "roads",
            TagFilter::new().with("highway", TagValues::one_of(["primary"])),
        )
        .with_layer("buildings", TagFilter::new().with("building", TagValues::Any))
}

fn durango() -> AreaOfInterest {
    AreaOfInterest::bbox(DURANGO[0], DURANGO[1], DURANGO[2], DURANGO[3]).unwrap()
}

fn output_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("trailmap-{name}-{}", std::process::id()))
}

fn builder(provider: PoolProvider, output_dir: PathBuf) -> TrailMileageMapBuilder {
    TrailMileageMapBuilder::new()
        .with_config(Config {
            output_dir,
            ..Config::default()
        })
        .with_geocoder(FixedGeocoder::default())
        .with_map_data_provider(provider)
}

#[test]
fn known_trail_segments() {
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let map = builder(provider.clone(), output_dir("known")).build().unwrap();

    let report = map.create(&durango(), &payload()).unwrap();

    assert_eq!(report.crs().code(), "EPSG:2774");
    assert_eq!(provider.request_count(), 3);
    assert_eq!(report.layers()["trails"].len(), 2);
    assert_eq!(report.mileage().segments(), 2);
    assert_relative_eq!(
        report.mileage().miles(),
        (500.0 + 1200.0) / 1609.344,
        epsilon = 1e-6
    );
    assert!(report
        .figure()
        .title()
        .starts_with("1.056 Miles of Trail Within Area of Interest Based on EPSG:2774"));
    assert_eq!(
        report.figure().drawn_layers(),
        ["mask", "buildings", "roads", "trails"]
    );
}

#[test]
fn unfiltered_trails_count_everything() {
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let map = builder(provider, output_dir("unfiltered"))
        .with_config(Config {
            filter_trails: false,
            ..Config::default()
        })
        .build()
        .unwrap();

    let report = map.create(&durango(), &payload()).unwrap();
    assert_relative_eq!(report.mileage().meters(), 2000.0, epsilon = 1e-3);
}

#[test]
fn failing_layer_aborts_without_figure() {
    let dir = output_dir("failing");
    let provider = PoolProvider {
        features: pool(),
        failing_key: Some("building"),
        ..Default::default()
    };
    let map = builder(provider.clone(), dir.clone()).build().unwrap();

    let result = map.create_and_save(&durango(), &payload());
    assert_matches!(
        result,
        Err(TrailmapError::FeatureFetch { layer, source: ProviderError::Remote(_) }) if layer == "buildings"
    );
    assert_eq!(provider.request_count(), 1);
    assert!(!map.output_path(&durango()).exists());
    assert!(!dir.exists());
}

#[test]
fn failing_layer_after_fetched_trails_aborts() {
    let dir = output_dir("failing-late");
    let provider = PoolProvider {
        features: pool(),
        failing_key: Some("natural"),
        ..Default::default()
    };
    let map = builder(provider.clone(), dir.clone()).build().unwrap();
    let payload = payload().with_layer(
        "water",
        TagFilter::new().with("natural", TagValues::one_of(["water"])),
    );

    let result = map.create_and_save(&durango(), &payload);
    assert_matches!(
        result,
        Err(TrailmapError::FeatureFetch { layer, source: ProviderError::Remote(_) }) if layer == "water"
    );
    assert_eq!(
        *provider.requests.lock().unwrap(),
        vec!["building", "highway", "highway", "natural"]
    );
    assert!(!map.output_path(&durango()).exists());
    assert!(!dir.exists());
}

#[test]
fn unstyled_layer_is_skipped() {
    let mut features = pool();
    features.push(feature(
        "way/6",
        &[("cycleway", "lane")],
        LineString::from(vec![(-107.9, 37.3), (-107.85, 37.3)]),
    ));
    let provider = PoolProvider {
        features,
        ..Default::default()
    };
    let map = builder(provider, output_dir("unstyled")).build().unwrap();

    let payload = payload().with_layer(
        "bike_lanes",
        TagFilter::new().with("cycleway", TagValues::Any),
    );
    let report = map.create(&durango(), &payload).unwrap();

    assert_eq!(report.layers()["bike_lanes"].len(), 1);
    assert_eq!(report.figure().skipped_layers(), ["bike_lanes"]);
    assert_eq!(
        report.figure().drawn_layers(),
        ["mask", "buildings", "roads", "trails"]
    );
    assert_relative_eq!(report.mileage().meters(), 1700.0, epsilon = 1e-3);
}

#[test]
fn invalid_bounds_fail_before_any_request() {
    assert_matches!(
        AreaOfInterest::bbox(37.25, 37.335, -107.81, -107.915),
        Err(TrailmapError::InvalidBounds(_))
    );
    assert_matches!(
        trailmap::BoundingBox::from_slice(&DURANGO[..3]),
        Err(TrailmapError::InvalidBounds(_))
    );
}

#[test]
fn unknown_place_fails_before_fetching() {
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let geocoder = FixedGeocoder::default();
    let map = TrailMileageMapBuilder::new()
        .with_geocoder(geocoder.clone())
        .with_map_data_provider(provider.clone())
        .build()
        .unwrap();

    let result = map.create(&AreaOfInterest::place("Atlantis"), &payload());
    assert_matches!(result, Err(TrailmapError::AreaNotFound { place, .. }) if place == "Atlantis");
    assert_eq!(*geocoder.requests.lock().unwrap(), 1);
    assert_eq!(provider.request_count(), 0);
}

#[test]
fn place_boundary_is_used_as_mask() {
    let boundary = geo_types::polygon![
        (x: -107.9, y: 37.26),
        (x: -107.84, y: 37.26),
        (x: -107.84, y: 37.31),
        (x: -107.9, y: 37.31),
    ];
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let map = TrailMileageMapBuilder::new()
        .with_geocoder(FixedGeocoder {
            boundary: Some(boundary.into()),
            ..Default::default()
        })
        .with_map_data_provider(provider)
        .build()
        .unwrap();

    let report = map
        .create(&AreaOfInterest::place("Durango, Colorado, USA"), &payload())
        .unwrap();
    assert_eq!(report.crs().code(), "EPSG:2774");
    assert!(report.area().bounding_box().is_none());

    // Both trails are inside the boundary, the road crosses it and is cut.
    assert_relative_eq!(report.mileage().meters(), 1700.0, epsilon = 1e-3);
    let roads = &report.layers()["roads"];
    assert_eq!(roads.len(), 1);
    let Geometry::MultiLineString(clipped) = roads.features()[0].geometry() else {
        panic!("clipped road must be a multi line string");
    };
    let clipped = clipped.euclidean_length();
    let original = LineString::from(vec![(-107.91, 37.262), (-107.82, 37.32)]).euclidean_length();
    assert!(clipped < original);
    assert!(clipped > 0.0);
}

#[test]
fn uncovered_area_falls_back_to_default_projection() {
    let provider = PoolProvider::default();
    let map = builder(provider, output_dir("arctic")).build().unwrap();

    let area = AreaOfInterest::bbox(85.6, 85.5, 10.1, 10.0).unwrap();
    let report = map.create(&area, &payload()).unwrap();

    assert_eq!(report.crs(), &Crs::EPSG3395);
    assert_eq!(report.mileage().miles(), 0.0);
    assert!(report.figure().title().contains("Based on EPSG:3395 Projection"));
}

#[test]
fn missing_trail_layer_counts_zero() {
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let map = builder(provider, output_dir("no-trails")).build().unwrap();

    let payload = FeatureLayersPayload::new()
        .with_layer("buildings", TagFilter::new().with("building", TagValues::Any));
    let report = map.create(&durango(), &payload).unwrap();
    assert_eq!(report.mileage().miles(), 0.0);
    assert_eq!(report.mileage().segments(), 0);
}

#[test]
fn empty_payload_is_rejected() {
    let provider = PoolProvider::default();
    let map = builder(provider.clone(), output_dir("empty")).build().unwrap();

    assert_matches!(
        map.create(&durango(), &FeatureLayersPayload::new()),
        Err(TrailmapError::Configuration(_))
    );
    assert_eq!(provider.request_count(), 0);
}

#[test]
fn figure_is_written() {
    let dir = output_dir("written");
    let provider = PoolProvider {
        features: pool(),
        ..Default::default()
    };
    let map = builder(provider, dir.clone()).build().unwrap();

    let report = map.create_and_save(&durango(), &payload()).unwrap();
    let path = report.output_path().unwrap();
    assert_eq!(path, dir.join("37.335_37.25_-107.81_-107.915-trails.svg"));

    let svg = std::fs::read_to_string(path).unwrap();
    assert!(svg.contains(report.figure().title()));

    std::fs::remove_dir_all(dir).unwrap();
}
