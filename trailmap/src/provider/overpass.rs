//! Map data from an [Overpass API](https://wiki.openstreetmap.org/wiki/Overpass_API) instance.

use std::collections::BTreeMap;

use geo::{Intersects, Simplify};
use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::area::ResolvedArea;
use crate::error::ProviderError;
use crate::layer::{Feature, TagFilter, TagValues};
use crate::provider::MapDataProvider;

/// Keys that make a closed way an area rather than a ring shaped line.
const AREA_KEYS: &[&str] = &[
    "amenity",
    "area:highway",
    "boundary",
    "building",
    "building:part",
    "landuse",
    "leisure",
    "man_made",
    "military",
    "natural",
    "place",
    "shop",
    "tourism",
    "water",
];

const LINEAR_NATURAL: &[&str] = &["coastline", "cliff", "ridge", "arete", "tree_row"];

/// Fetches features with one Overpass QL request per layer.
pub struct OverpassProvider {
    client: Client,
    url: String,
    timeout_secs: u64,
    max_query_vertices: usize,
}

impl OverpassProvider {
    /// Creates a provider for the given interpreter endpoint.
    pub fn new(url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            url: url.into(),
            timeout_secs: 180,
            max_query_vertices: 500,
        }
    }

    /// Server side timeout of one query.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Maximum number of vertices of a query polygon. Larger boundaries are simplified.
    pub fn with_max_query_vertices(mut self, max_query_vertices: usize) -> Self {
        self.max_query_vertices = max_query_vertices.max(4);
        self
    }

    /// Builds the Overpass QL query selecting the features of the filter inside the area.
    pub fn build_query(
        &self,
        area: &ResolvedArea,
        filter: &TagFilter,
    ) -> Result<String, ProviderError> {
        if filter.is_empty() {
            return Err(ProviderError::InvalidFilter(
                "filter has no tag keys".to_string(),
            ));
        }

        let scopes = self.scopes(area);
        if scopes.is_empty() {
            return Err(ProviderError::InvalidFilter(
                "area has no query geometry".to_string(),
            ));
        }

        let mut query = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);
        for (key, values) in filter.iter() {
            let selector = tag_selector(key, values)?;
            for scope in &scopes {
                query.push_str(&format!("  nwr{selector}({scope});\n"));
            }
        }
        query.push_str(");\nout geom;");

        Ok(query)
    }

    fn scopes(&self, area: &ResolvedArea) -> Vec<String> {
        if let Some(bbox) = area.bounding_box() {
            return vec![format!(
                "{},{},{},{}",
                bbox.south(),
                bbox.west(),
                bbox.north(),
                bbox.east()
            )];
        }

        area.geometry()
            .iter()
            .map(|polygon| self.simplified_exterior(polygon))
            .filter(|ring| ring.0.len() >= 4)
            .map(|ring| {
                let vertices: Vec<String> = ring.0[..ring.0.len() - 1]
                    .iter()
                    .map(|c| format!("{} {}", c.y, c.x))
                    .collect();
                format!("poly:\"{}\"", vertices.join(" "))
            })
            .collect()
    }

    fn simplified_exterior(&self, polygon: &Polygon) -> LineString {
        let mut ring = polygon.exterior().clone();
        let mut epsilon = 1e-5;
        while ring.0.len() > self.max_query_vertices && epsilon < 1.0 {
            ring = polygon.exterior().simplify(&epsilon);
            epsilon *= 2.0;
        }

        ring
    }
}

impl MapDataProvider for OverpassProvider {
    fn fetch(&self, area: &ResolvedArea, filter: &TagFilter) -> Result<Vec<Feature>, ProviderError> {
        let query = self.build_query(area, filter)?;
        debug!("Sending Overpass query:\n{query}");

        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        parse_response(&response.text()?)
    }
}

fn tag_selector(key: &str, values: &TagValues) -> Result<String, ProviderError> {
    if key.is_empty() {
        return Err(ProviderError::InvalidFilter("empty tag key".to_string()));
    }
    if key.chars().any(char::is_control) {
        return Err(ProviderError::InvalidFilter(format!(
            "tag key {key:?} contains control characters"
        )));
    }

    let key = escape_string(key);
    match values {
        TagValues::Any => Ok(format!("[\"{key}\"]")),
        TagValues::OneOf(values) => {
            if values.is_empty() {
                return Err(ProviderError::InvalidFilter(format!(
                    "no values given for tag key \"{key}\""
                )));
            }
            if let Some(value) = values
                .iter()
                .find(|v| v.is_empty() || v.chars().any(char::is_control))
            {
                return Err(ProviderError::InvalidFilter(format!(
                    "invalid value {value:?} for tag key \"{key}\""
                )));
            }

            let alternatives: Vec<String> = values.iter().map(|v| escape_regex(v)).collect();
            let pattern = escape_string(&format!("^({})$", alternatives.join("|")));
            Ok(format!("[\"{key}\"~\"{pattern}\"]"))
        }
    }
}

fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    remark: Option<String>,
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl From<LatLon> for Coord {
    fn from(value: LatLon) -> Self {
        Coord {
            x: value.lon,
            y: value.lat,
        }
    }
}

fn parse_response(body: &str) -> Result<Vec<Feature>, ProviderError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::Decoding(err.to_string()))?;

    if let Some(remark) = response.remark.filter(|r| r.contains("error")) {
        return Err(ProviderError::Remote(remark));
    }

    Ok(response
        .elements
        .into_iter()
        .filter_map(into_feature)
        .collect())
}

fn into_feature(element: Element) -> Option<Feature> {
    match element {
        Element::Node { id, lat, lon, tags } => Some(Feature::new(
            format!("node/{id}"),
            tags,
            Point::new(lon, lat).into(),
        )),
        Element::Way { id, geometry, tags } => {
            let coords = to_coords(geometry);
            if coords.len() < 2 {
                debug!("Skipping way {id} without geometry");
                return None;
            }

            let line = LineString::new(coords);
            let geometry: Geometry = if line.is_closed() && line.0.len() >= 4 && is_area(&tags) {
                Polygon::new(line, vec![]).into()
            } else {
                line.into()
            };

            Some(Feature::new(format!("way/{id}"), tags, geometry))
        }
        Element::Relation { id, members, tags } => {
            let geometry = match tags.get("type").map(String::as_str) {
                Some("multipolygon") | Some("boundary") => {
                    let polygons = assemble_polygons(id, members);
                    if polygons.0.is_empty() {
                        None
                    } else {
                        Some(Geometry::MultiPolygon(polygons))
                    }
                }
                _ => {
                    let lines: Vec<LineString> = members
                        .into_iter()
                        .filter(|member| member.kind == "way")
                        .map(|member| LineString::new(to_coords(member.geometry)))
                        .filter(|line| line.0.len() >= 2)
                        .collect();
                    if lines.is_empty() {
                        None
                    } else {
                        Some(Geometry::MultiLineString(MultiLineString::new(lines)))
                    }
                }
            };

            match geometry {
                Some(geometry) => Some(Feature::new(format!("relation/{id}"), tags, geometry)),
                None => {
                    debug!("Skipping relation {id} without usable geometry");
                    None
                }
            }
        }
        Element::Other => None,
    }
}

fn to_coords(geometry: Vec<Option<LatLon>>) -> Vec<Coord> {
    geometry.into_iter().flatten().map(Coord::from).collect()
}

fn is_area(tags: &BTreeMap<String, String>) -> bool {
    match tags.get("area").map(String::as_str) {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }

    if let Some(natural) = tags.get("natural") {
        if LINEAR_NATURAL.contains(&natural.as_str()) {
            return false;
        }
    }

    tags.get("waterway").map(String::as_str) == Some("riverbank")
        || AREA_KEYS.iter().any(|key| tags.contains_key(*key))
}

fn assemble_polygons(id: i64, members: Vec<Member>) -> MultiPolygon {
    let mut outer = vec![];
    let mut inner = vec![];
    for member in members.into_iter().filter(|member| member.kind == "way") {
        let coords = to_coords(member.geometry);
        if coords.len() < 2 {
            continue;
        }

        match member.role.as_str() {
            "inner" => inner.push(coords),
            _ => outer.push(coords),
        }
    }

    let mut polygons: Vec<Polygon> = assemble_rings(id, outer)
        .into_iter()
        .map(|ring| Polygon::new(ring, vec![]))
        .collect();

    for hole in assemble_rings(id, inner) {
        let probe = Point::from(hole.0[0]);
        match polygons.iter_mut().find(|polygon| polygon.intersects(&probe)) {
            Some(polygon) => polygon.interiors_push(hole),
            None => debug!("Dropping inner ring of relation {id} outside of any outer ring"),
        }
    }

    MultiPolygon::new(polygons)
}

/// Joins way segments sharing end points into closed rings.
fn assemble_rings(id: i64, mut segments: Vec<Vec<Coord>>) -> Vec<LineString> {
    let mut rings = vec![];
    while let Some(mut current) = segments.pop() {
        loop {
            if current.len() >= 4 && current.first() == current.last() {
                rings.push(LineString::new(current));
                break;
            }

            let Some(end) = current.last().copied() else {
                break;
            };

            let next = segments
                .iter()
                .position(|segment| segment.first() == Some(&end) || segment.last() == Some(&end));

            match next {
                Some(index) => {
                    let mut segment = segments.swap_remove(index);
                    if segment.first() != Some(&end) {
                        segment.reverse();
                    }
                    current.extend(segment.into_iter().skip(1));
                }
                None => {
                    debug!(
                        "Dropping unclosed ring of relation {id} with {} vertices",
                        current.len()
                    );
                    break;
                }
            }
        }
    }

    rings
}
