//! Area of interest: what the caller asks for and the query geometry it resolves to.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use geo::{BoundingRect, Centroid};
use geo_types::{coord, Geometry, MultiPolygon, Point, Polygon, Rect};
use log::info;

use crate::error::{Result, TrailmapError};
use crate::provider::Geocoder;

/// Bounding box in geographic coordinates (degrees).
///
/// Constructed only through [`BoundingBox::new`], so an instance always satisfies
/// `north > south` and `east > west`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    north: f64,
    south: f64,
    east: f64,
    west: f64,
}

impl BoundingBox {
    /// Creates a bounding box, validating the bounds.
    ///
    /// Boxes crossing the antimeridian (`east < west`) are not supported.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        for (name, value, limit) in [
            ("north", north, 90.0),
            ("south", south, 90.0),
            ("east", east, 180.0),
            ("west", west, 180.0),
        ] {
            if !value.is_finite() || value.abs() > limit {
                return Err(TrailmapError::InvalidBounds(format!(
                    "{name} bound {value} is outside of [-{limit}, {limit}]"
                )));
            }
        }

        if north <= south {
            return Err(TrailmapError::InvalidBounds(format!(
                "north bound {north} must be greater than south bound {south}"
            )));
        }

        if east <= west {
            return Err(TrailmapError::InvalidBounds(format!(
                "east bound {east} must be greater than west bound {west}"
            )));
        }

        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Creates a bounding box from a `[north, south, east, west]` sequence.
    pub fn from_slice(bounds: &[f64]) -> Result<Self> {
        match *bounds {
            [north, south, east, west] => Self::new(north, south, east, west),
            _ => Err(TrailmapError::InvalidBounds(format!(
                "expected exactly four bounds [north, south, east, west], got {}",
                bounds.len()
            ))),
        }
    }

    /// Northern latitude.
    pub fn north(&self) -> f64 {
        self.north
    }

    /// Southern latitude.
    pub fn south(&self) -> f64 {
        self.south
    }

    /// Eastern longitude.
    pub fn east(&self) -> f64 {
        self.east
    }

    /// Western longitude.
    pub fn west(&self) -> f64 {
        self.west
    }

    /// The box as a rectangle with `x` = longitude and `y` = latitude.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            coord!(x: self.west, y: self.south),
            coord!(x: self.east, y: self.north),
        )
    }

    /// The box as a closed polygon.
    pub fn to_polygon(&self) -> Polygon {
        self.to_rect().to_polygon()
    }

    /// Geometric center of the box.
    pub fn centroid(&self) -> Point {
        self.to_rect().center().into()
    }
}

impl FromStr for BoundingBox {
    type Err = TrailmapError;

    /// Parses `north,south,east,west`.
    fn from_str(s: &str) -> Result<Self> {
        let bounds = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| TrailmapError::InvalidBounds(format!("'{s}': {err}")))?;
        Self::from_slice(&bounds)
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Region to fetch the features for.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaOfInterest {
    /// Free-text place name, resolved to a boundary by a [`Geocoder`].
    Place(String),
    /// Explicit bounding box.
    BoundingBox(BoundingBox),
}

impl AreaOfInterest {
    /// Area given by a place name.
    pub fn place(name: impl Into<String>) -> Self {
        Self::Place(name.into())
    }

    /// Area given by bounds, see [`BoundingBox::new`].
    pub fn bbox(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        Ok(Self::BoundingBox(BoundingBox::new(north, south, east, west)?))
    }

    /// File system friendly name of the area.
    pub fn slug(&self) -> String {
        let raw = match self {
            AreaOfInterest::Place(name) => name.to_lowercase(),
            AreaOfInterest::BoundingBox(bbox) => format!(
                "{}_{}_{}_{}",
                bbox.north, bbox.south, bbox.east, bbox.west
            ),
        };

        let mut slug = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_alphanumeric() || c == '.' || c == '-' {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }

        let slug = slug.trim_end_matches('_');
        if slug.is_empty() {
            "area".to_string()
        } else {
            slug.to_string()
        }
    }
}

impl From<BoundingBox> for AreaOfInterest {
    fn from(value: BoundingBox) -> Self {
        Self::BoundingBox(value)
    }
}

impl Display for AreaOfInterest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaOfInterest::Place(name) => f.write_str(name),
            AreaOfInterest::BoundingBox(bbox) => bbox.fmt(f),
        }
    }
}

/// Area of interest resolved into a query geometry.
#[derive(Debug, Clone)]
pub struct ResolvedArea {
    area: AreaOfInterest,
    geometry: MultiPolygon,
    centroid: Point,
}

impl ResolvedArea {
    /// Area as requested by the caller.
    pub fn area(&self) -> &AreaOfInterest {
        &self.area
    }

    /// Query geometry in geographic coordinates.
    pub fn geometry(&self) -> &MultiPolygon {
        &self.geometry
    }

    /// Centroid of the query geometry.
    pub fn centroid(&self) -> Point {
        self.centroid
    }

    /// Bounding box of the requested area, if the area was given as a box.
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        match &self.area {
            AreaOfInterest::BoundingBox(bbox) => Some(bbox),
            AreaOfInterest::Place(_) => None,
        }
    }

    /// Extent of the query geometry.
    pub fn extent(&self) -> Option<Rect> {
        self.geometry.bounding_rect()
    }
}

/// Normalizes an [`AreaOfInterest`] into a query polygon and its centroid.
pub struct AreaResolver<'a> {
    geocoder: &'a dyn Geocoder,
}

impl<'a> AreaResolver<'a> {
    /// Creates a resolver that uses the given geocoder for place names.
    pub fn new(geocoder: &'a dyn Geocoder) -> Self {
        Self { geocoder }
    }

    /// Resolves the area.
    ///
    /// Bounding boxes are converted directly without any network access. Place names are
    /// looked up with the geocoder and fail with [`TrailmapError::AreaNotFound`] if nothing
    /// (or nothing polygonal) matches.
    pub fn resolve(&self, area: &AreaOfInterest) -> Result<ResolvedArea> {
        let resolved = match area {
            AreaOfInterest::BoundingBox(bbox) => ResolvedArea {
                area: area.clone(),
                geometry: MultiPolygon::new(vec![bbox.to_polygon()]),
                centroid: bbox.centroid(),
            },
            AreaOfInterest::Place(place) => self.resolve_place(place)?,
        };

        info!(
            "Resolved area {} with centroid ({:.5}, {:.5})",
            resolved.area,
            resolved.centroid.y(),
            resolved.centroid.x()
        );

        Ok(resolved)
    }

    fn resolve_place(&self, place: &str) -> Result<ResolvedArea> {
        let not_found = |reason: &str| TrailmapError::AreaNotFound {
            place: place.to_string(),
            reason: reason.to_string(),
        };

        let boundary = self
            .geocoder
            .geocode(place)
            .map_err(|source| TrailmapError::Geocoding {
                place: place.to_string(),
                source,
            })?
            .ok_or_else(|| not_found("no match"))?;

        let geometry = match boundary {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            Geometry::MultiPolygon(multi_polygon) => multi_polygon,
            _ => return Err(not_found("boundary is not a polygon")),
        };

        let centroid = geometry
            .centroid()
            .ok_or_else(|| not_found("boundary is empty"))?;

        Ok(ResolvedArea {
            area: AreaOfInterest::Place(place.to_string()),
            geometry,
            centroid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use assert_matches::assert_matches;
    use geo::Contains;
    use geo_types::{point, polygon};
    use insta::assert_compact_debug_snapshot;

    struct FixedGeocoder(Option<Geometry>);

    impl Geocoder for FixedGeocoder {
        fn geocode(&self, _place: &str) -> std::result::Result<Option<Geometry>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGeocoder;

    impl Geocoder for FailingGeocoder {
        fn geocode(&self, _place: &str) -> std::result::Result<Option<Geometry>, ProviderError> {
            Err(ProviderError::Status(503))
        }
    }

    fn durango() -> BoundingBox {
        BoundingBox::new(37.335, 37.25, -107.81, -107.915).unwrap()
    }

    #[test]
    fn bbox_polygon_has_centroid_inside() {
        let resolver = AreaResolver::new(&FailingGeocoder);
        let resolved = resolver.resolve(&durango().into()).unwrap();

        assert_eq!(resolved.geometry().0.len(), 1);
        let polygon = &resolved.geometry().0[0];
        assert!(polygon.contains(&resolved.centroid()));
        assert!((resolved.centroid().y() - 37.2925).abs() < 1e-9);
        assert!((resolved.centroid().x() - -107.8625).abs() < 1e-9);
        assert_eq!(resolved.bounding_box(), Some(&durango()));
    }

    #[test]
    fn centroid_inside_for_many_boxes() {
        for (north, south, east, west) in [
            (1.0, 0.0, 1.0, 0.0),
            (-10.0, -10.5, 170.0, 169.9),
            (89.9, 60.0, 179.9, -179.9),
            (0.001, -0.001, 0.001, -0.001),
        ] {
            let bbox = BoundingBox::new(north, south, east, west).unwrap();
            assert!(bbox.to_polygon().contains(&bbox.centroid()));
        }
    }

    #[test]
    fn invalid_bounds() {
        assert_compact_debug_snapshot!(
            BoundingBox::new(37.25, 37.335, -107.81, -107.915),
            @r#"Err(InvalidBounds("north bound 37.25 must be greater than south bound 37.335"))"#
        );
        assert_matches!(
            BoundingBox::new(37.3, 37.3, -107.81, -107.915),
            Err(TrailmapError::InvalidBounds(_))
        );
        assert_matches!(
            BoundingBox::new(37.335, 37.25, -107.915, -107.915),
            Err(TrailmapError::InvalidBounds(_))
        );
        assert_matches!(
            BoundingBox::new(95.0, 37.25, -107.81, -107.915),
            Err(TrailmapError::InvalidBounds(_))
        );
        assert_matches!(
            BoundingBox::new(f64::NAN, 37.25, -107.81, -107.915),
            Err(TrailmapError::InvalidBounds(_))
        );
        assert_compact_debug_snapshot!(
            BoundingBox::from_slice(&[1.0, 2.0, 3.0]),
            @r#"Err(InvalidBounds("expected exactly four bounds [north, south, east, west], got 3"))"#
        );
    }

    #[test]
    fn parse_bbox() {
        let bbox: BoundingBox = "37.335, 37.25, -107.81, -107.915".parse().unwrap();
        assert_eq!(bbox, durango());
        assert_matches!(
            "37.335,abc,-107.81,-107.915".parse::<BoundingBox>(),
            Err(TrailmapError::InvalidBounds(_))
        );
    }

    #[test]
    fn slugs() {
        assert_eq!(
            AreaOfInterest::from(durango()).slug(),
            "37.335_37.25_-107.81_-107.915"
        );
        assert_eq!(
            AreaOfInterest::place("Durango, Colorado, USA").slug(),
            "durango_colorado_usa"
        );
        assert_eq!(AreaOfInterest::place("  ").slug(), "area");
    }

    #[test]
    fn place_is_geocoded() {
        let boundary = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
        ];
        let geocoder = FixedGeocoder(Some(Geometry::Polygon(boundary)));
        let resolved = AreaResolver::new(&geocoder)
            .resolve(&AreaOfInterest::place("Square"))
            .unwrap();

        assert_eq!(resolved.centroid(), point!(x: 1.0, y: 1.0));
        assert_eq!(resolved.bounding_box(), None);
    }

    #[test]
    fn place_not_found() {
        let resolver_none = FixedGeocoder(None);
        assert_matches!(
            AreaResolver::new(&resolver_none).resolve(&AreaOfInterest::place("Nowhere")),
            Err(TrailmapError::AreaNotFound { place, .. }) if place == "Nowhere"
        );

        let point_only = FixedGeocoder(Some(Geometry::Point(point!(x: 1.0, y: 1.0))));
        assert_matches!(
            AreaResolver::new(&point_only).resolve(&AreaOfInterest::place("A point")),
            Err(TrailmapError::AreaNotFound { .. })
        );

        assert_matches!(
            AreaResolver::new(&FailingGeocoder).resolve(&AreaOfInterest::place("Down")),
            Err(TrailmapError::Geocoding {
                source: ProviderError::Status(503),
                ..
            })
        );
    }
}
