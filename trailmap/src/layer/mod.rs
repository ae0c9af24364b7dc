//! Feature layers: what to fetch (tag filters) and what was fetched (features).

use std::collections::BTreeMap;
use std::path::Path;

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailmapError};

mod clip;
mod trail_filter;

pub use clip::clip_layer;
pub use trail_filter::{filter_trails, FOOTWAY_SURFACES};

const DEFAULT_LAYERS: &str = include_str!("../../resources/default_layers.json");

/// Accepted values of a single tag key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTagValues", into = "RawTagValues")]
pub enum TagValues {
    /// Any value of the key is accepted. Written as `true` in JSON.
    Any,
    /// Only the listed values are accepted.
    OneOf(Vec<String>),
}

impl TagValues {
    /// Allow-list of values.
    pub fn one_of<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Checks if the tag value is accepted.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            TagValues::Any => true,
            TagValues::OneOf(values) => values.iter().any(|v| v == value),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTagValues {
    Flag(bool),
    Single(String),
    List(Vec<String>),
}

impl TryFrom<RawTagValues> for TagValues {
    type Error = String;

    fn try_from(value: RawTagValues) -> std::result::Result<Self, Self::Error> {
        match value {
            RawTagValues::Flag(true) => Ok(Self::Any),
            RawTagValues::Flag(false) => {
                Err("`false` is not a valid tag value, use `true` or a list of values".into())
            }
            RawTagValues::Single(value) => Ok(Self::OneOf(vec![value])),
            RawTagValues::List(values) if values.is_empty() => {
                Err("list of tag values must not be empty".into())
            }
            RawTagValues::List(values) => Ok(Self::OneOf(values)),
        }
    }
}

impl From<TagValues> for RawTagValues {
    fn from(value: TagValues) -> Self {
        match value {
            TagValues::Any => Self::Flag(true),
            TagValues::OneOf(values) => Self::List(values),
        }
    }
}

/// Tag filter of one layer: OSM tag key to accepted values.
///
/// A feature matches the filter if it matches at least one of the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilter(BTreeMap<String, TagValues>);

impl TagFilter {
    /// Empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key to the filter.
    pub fn with(mut self, key: impl Into<String>, values: TagValues) -> Self {
        self.0.insert(key.into(), values);
        self
    }

    /// Iterates over keys and their accepted values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValues)> {
        self.0.iter().map(|(key, values)| (key.as_str(), values))
    }

    /// Returns true if the filter has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks if a feature with the given tags is selected by this filter.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        self.0.iter().any(|(key, values)| {
            tags.get(key)
                .map(|value| values.matches(value))
                .unwrap_or(false)
        })
    }
}

/// Named layers to fetch, as given by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureLayersPayload {
    layers: BTreeMap<String, TagFilter>,
}

impl FeatureLayersPayload {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers drawn by default: highways, roads, streets, trails, parks, water and buildings.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(DEFAULT_LAYERS)
    }

    /// Parses a payload like `{"trails": {"highway": ["path", "footway"]}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            TrailmapError::Configuration(format!("invalid feature layers payload: {err}"))
        })
    }

    /// Reads the payload from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Adds (or replaces) a layer.
    pub fn with_layer(mut self, name: impl Into<String>, filter: TagFilter) -> Self {
        self.layers.insert(name.into(), filter);
        self
    }

    /// Filter of the layer with the given name.
    pub fn get(&self, name: &str) -> Option<&TagFilter> {
        self.layers.get(name)
    }

    /// Iterates over the layers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagFilter)> {
        self.layers
            .iter()
            .map(|(name, filter)| (name.as_str(), filter))
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Single map feature with its source attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: String,
    tags: BTreeMap<String, String>,
    geometry: Geometry,
}

impl Feature {
    /// Creates a feature. Geometry is expected in geographic coordinates.
    pub fn new(id: impl Into<String>, tags: BTreeMap<String, String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            tags,
            geometry,
        }
    }

    /// Source identifier, e.g. `way/12345`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All tags of the feature.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Value of a single tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Feature geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Returns the same feature with another geometry.
    pub fn with_geometry(self, geometry: Geometry) -> Self {
        Self { geometry, ..self }
    }
}

/// Features fetched for one named layer. May be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    name: String,
    features: Vec<Feature>,
}

impl FeatureLayer {
    /// Creates a layer.
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            features,
        }
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Features of the layer.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Iterates over the geometries of all features.
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry> {
        self.features.iter().map(Feature::geometry)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the layer has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Keeps only the features for which the predicate returns true.
    pub fn retain(&mut self, predicate: impl FnMut(&Feature) -> bool) {
        self.features.retain(predicate);
    }

    /// Consumes the layer returning its features.
    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}
