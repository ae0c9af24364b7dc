//! Length of the trail network in miles.

use geo::EuclideanLength;
use geo_types::{Coord, Geometry};
use log::info;
use trailmap_types::geo::impls::projection::GeodesyProjection;
use trailmap_types::geo::Crs;
use trailmap_types::Reproject;

use crate::error::Result;
use crate::layer::FeatureLayer;

/// Length of the international mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Computed trail length.
#[derive(Debug, Clone, PartialEq)]
pub struct Mileage {
    miles: f64,
    crs: Crs,
    segments: usize,
}

impl Mileage {
    /// Length in miles.
    pub fn miles(&self) -> f64 {
        self.miles
    }

    /// Length in meters.
    pub fn meters(&self) -> f64 {
        self.miles * METERS_PER_MILE
    }

    /// Coordinate system the lengths were measured in.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Number of linear features that contributed to the length.
    pub fn segments(&self) -> usize {
        self.segments
    }
}

/// Measures linear features in a projected coordinate system.
pub struct MileageCalculator {
    crs: Crs,
    projection: GeodesyProjection<Coord, Coord>,
}

impl MileageCalculator {
    /// Creates a calculator measuring in the given system. Its unit must be the meter.
    pub fn new(crs: &Crs) -> Result<Self> {
        Ok(Self {
            crs: crs.clone(),
            projection: crs.get_projection()?,
        })
    }

    /// Total length of the layer's lines.
    ///
    /// Geometries are reprojected from geographic coordinates before measuring. Points and
    /// polygons do not contribute. An empty layer has the length of exactly `0.0`.
    pub fn calculate(&self, layer: &FeatureLayer) -> Result<Mileage> {
        let mut meters = 0.0;
        let mut segments = 0;
        for geometry in layer.geometries().filter(|g| is_linear(g)) {
            let projected = geometry.reproject(&self.projection)?;
            meters += linear_length(&projected);
            segments += 1;
        }

        let mileage = Mileage {
            miles: meters / METERS_PER_MILE,
            crs: self.crs.clone(),
            segments,
        };

        info!(
            "Layer {} has {:.3} miles of trail in {} features",
            layer.name(),
            mileage.miles,
            segments
        );

        Ok(mileage)
    }
}

fn is_linear(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => true,
        Geometry::GeometryCollection(collection) => collection.iter().any(is_linear),
        _ => false,
    }
}

/// Planar length of the linear parts of a geometry, in the units of its coordinates.
pub fn linear_length(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Line(line) => line.euclidean_length(),
        Geometry::LineString(line) => line.euclidean_length(),
        Geometry::MultiLineString(lines) => lines.euclidean_length(),
        Geometry::GeometryCollection(collection) => collection.iter().map(linear_length).sum(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Feature;
    use approx::assert_relative_eq;
    use geo::GeodesicLength;
    use geo_types::{line_string, point, polygon, LineString, MultiLineString};
    use std::collections::BTreeMap;
    use trailmap_types::geo::Projection;

    fn colorado_south() -> Crs {
        Crs::new(
            "EPSG:2774",
            "lcc lat_1=38.4333333333333 lat_2=37.2333333333333 lat_0=36.6666666666667 \
             lon_0=-105.5 x_0=914401.8289 y_0=304800.6096 ellps=GRS80",
        )
    }

    fn layer(geometries: Vec<Geometry>) -> FeatureLayer {
        FeatureLayer::new(
            "trails",
            geometries
                .into_iter()
                .enumerate()
                .map(|(i, g)| Feature::new(format!("way/{i}"), BTreeMap::new(), g))
                .collect(),
        )
    }

    /// Straight line of the given length starting at the point, built in projected space.
    fn projected_line(calculator: &MileageCalculator, from: Coord, meters: f64) -> LineString {
        let start = calculator.projection.project(&from).unwrap();
        let end = Coord {
            x: start.x + meters * 0.6,
            y: start.y + meters * 0.8,
        };
        line_string![start, end].unproject(&calculator.projection).unwrap()
    }

    #[test]
    fn empty_layer_is_zero() {
        let calculator = MileageCalculator::new(&colorado_south()).unwrap();
        let mileage = calculator.calculate(&layer(vec![])).unwrap();
        assert_eq!(mileage.miles(), 0.0);
        assert_eq!(mileage.segments(), 0);
        assert_eq!(mileage.crs().code(), "EPSG:2774");
    }

    #[test]
    fn known_segments() {
        let calculator = MileageCalculator::new(&colorado_south()).unwrap();
        let a = projected_line(&calculator, Coord { x: -107.9, y: 37.26 }, 500.0);
        let b = projected_line(&calculator, Coord { x: -107.85, y: 37.3 }, 1200.0);

        let mileage = calculator
            .calculate(&layer(vec![a.into(), b.into()]))
            .unwrap();
        assert_relative_eq!(mileage.miles(), 1700.0 / 1609.344, epsilon = 1e-6);
        assert_relative_eq!(mileage.miles(), 1.0563, epsilon = 1e-4);
        assert_relative_eq!(mileage.meters(), 1700.0, epsilon = 1e-3);
        assert_eq!(mileage.segments(), 2);
    }

    #[test]
    fn order_does_not_matter() {
        let calculator = MileageCalculator::new(&colorado_south()).unwrap();
        let geometries: Vec<Geometry> = vec![
            line_string![(x: -107.9, y: 37.26), (x: -107.89, y: 37.27)].into(),
            line_string![(x: -107.85, y: 37.3), (x: -107.84, y: 37.29), (x: -107.83, y: 37.31)]
                .into(),
            MultiLineString::new(vec![line_string![(x: -107.88, y: 37.28), (x: -107.87, y: 37.28)]])
                .into(),
        ];

        let forward = calculator.calculate(&layer(geometries.clone())).unwrap();
        let backward = calculator
            .calculate(&layer(geometries.into_iter().rev().collect()))
            .unwrap();
        assert_relative_eq!(forward.miles(), backward.miles(), epsilon = 1e-12);
        assert!(forward.miles() > 0.0);
    }

    #[test]
    fn non_linear_geometries_are_ignored() {
        let calculator = MileageCalculator::new(&colorado_south()).unwrap();
        let line = projected_line(&calculator, Coord { x: -107.9, y: 37.26 }, 1609.344);
        let mileage = calculator
            .calculate(&layer(vec![
                line.into(),
                point!(x: -107.9, y: 37.3).into(),
                polygon![(x: -107.9, y: 37.26), (x: -107.8, y: 37.26), (x: -107.8, y: 37.3)].into(),
            ]))
            .unwrap();

        assert_relative_eq!(mileage.miles(), 1.0, epsilon = 1e-6);
        assert_eq!(mileage.segments(), 1);
    }

    #[test]
    fn geodesic_mile_measures_one_mile() {
        let calculator = MileageCalculator::new(&colorado_south()).unwrap();
        let line = projected_line(&calculator, Coord { x: -107.88, y: 37.29 }, METERS_PER_MILE);

        // The line must really be a mile long on the ellipsoid.
        let geodesic = line.geodesic_length();
        assert!((geodesic - METERS_PER_MILE).abs() / METERS_PER_MILE < 0.01);

        // Measure a geodesically exact mile too: move the end point along the line until the
        // geodesic length matches.
        let scale = METERS_PER_MILE / geodesic;
        let start = line.0[0];
        let end = line.0[1];
        let exact: LineString = vec![
            start,
            Coord {
                x: start.x + (end.x - start.x) * scale,
                y: start.y + (end.y - start.y) * scale,
            },
        ]
        .into();
        assert_relative_eq!(exact.geodesic_length(), METERS_PER_MILE, max_relative = 1e-4);

        let mileage = calculator.calculate(&layer(vec![exact.into()])).unwrap();
        assert!((mileage.miles() - 1.0).abs() < 0.01);
    }

    #[test]
    fn planar_length() {
        let collection = Geometry::GeometryCollection(geo_types::GeometryCollection(vec![
            line_string![(x: 0.0, y: 0.0), (x: 3.0, y: 4.0)].into(),
            point!(x: 1.0, y: 1.0).into(),
        ]));
        assert_relative_eq!(linear_length(&collection), 5.0);
        assert_eq!(linear_length(&point!(x: 1.0, y: 1.0).into()), 0.0);
    }
}
