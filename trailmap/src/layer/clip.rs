use geo::{BooleanOps, Intersects};
use geo_types::{Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon};
use log::debug;

use super::{Feature, FeatureLayer};

/// Clips every feature of the layer to the mask.
///
/// Points outside of the mask are dropped, lines are cut at the mask boundary and polygons are
/// intersected with it. Features left without any geometry are removed from the layer.
pub fn clip_layer(layer: FeatureLayer, mask: &MultiPolygon) -> FeatureLayer {
    let name = layer.name().to_string();
    let before = layer.len();

    let features: Vec<Feature> = layer
        .into_features()
        .into_iter()
        .filter_map(|feature| {
            let clipped = clip_geometry(feature.geometry(), mask)?;
            Some(feature.with_geometry(clipped))
        })
        .collect();

    debug!(
        "Clipped layer {name}: {} of {before} features kept",
        features.len()
    );

    FeatureLayer::new(name, features)
}

fn clip_geometry(geometry: &Geometry, mask: &MultiPolygon) -> Option<Geometry> {
    let clipped = match geometry {
        Geometry::Point(point) => mask.intersects(point).then(|| Geometry::Point(*point))?,
        Geometry::MultiPoint(points) => {
            let inside: Vec<_> = points
                .iter()
                .filter(|point| mask.intersects(*point))
                .copied()
                .collect();
            Geometry::MultiPoint(MultiPoint::new(inside))
        }
        Geometry::Line(line) => clip_lines(mask, vec![LineString::from(*line)]),
        Geometry::LineString(line) => clip_lines(mask, vec![line.clone()]),
        Geometry::MultiLineString(lines) => clip_lines(mask, lines.0.clone()),
        Geometry::Polygon(polygon) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![polygon.clone()]).intersection(mask))
        }
        Geometry::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons.intersection(mask)),
        Geometry::Rect(rect) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![rect.to_polygon()]).intersection(mask))
        }
        Geometry::Triangle(triangle) => Geometry::MultiPolygon(
            MultiPolygon::new(vec![triangle.to_polygon()]).intersection(mask),
        ),
        Geometry::GeometryCollection(collection) => {
            let parts: Vec<_> = collection
                .iter()
                .filter_map(|part| clip_geometry(part, mask))
                .collect();
            Geometry::GeometryCollection(GeometryCollection(parts))
        }
    };

    (!is_empty(&clipped)).then_some(clipped)
}

fn clip_lines(mask: &MultiPolygon, lines: Vec<LineString>) -> Geometry {
    Geometry::MultiLineString(mask.clip(&MultiLineString::new(lines), false))
}

fn is_empty(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::MultiPoint(points) => points.0.is_empty(),
        Geometry::MultiLineString(lines) => lines.0.iter().all(|line| line.0.len() < 2),
        Geometry::MultiPolygon(polygons) => polygons.0.is_empty(),
        Geometry::GeometryCollection(collection) => collection.0.is_empty(),
        _ => false,
    }
}
