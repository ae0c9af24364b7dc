use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use crate::cartesian::NewCartesianPoint2d;
use crate::error::TrailmapTypesError;
use crate::geo::impls::projection::GeodesyProjection;
use crate::geo::traits::point::NewGeoPoint;

/// Coordinate reference system.
///
/// A CRS is identified by its `code` (usually an EPSG identifier like `EPSG:2774`) and is
/// described by a `definition` - an operator string for the [`geodesy`] crate that converts
/// geographic WGS84 coordinates into the projected coordinates of this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Crs {
    code: Cow<'static, str>,
    definition: Cow<'static, str>,
}

impl Crs {
    /// World Mercator on the WGS84 ellipsoid.
    pub const EPSG3395: Crs = Crs {
        code: Cow::Borrowed("EPSG:3395"),
        definition: Cow::Borrowed("merc ellps=WGS84"),
    };

    /// Creates a new CRS record.
    pub fn new(code: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            code: Cow::Owned(code.into()),
            definition: Cow::Owned(definition.into()),
        }
    }

    /// Identifier of the system, e.g. `EPSG:2774`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Operator definition used to project into this system.
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Creates a projection from geographic points into this system.
    pub fn get_projection<In, Out>(&self) -> Result<GeodesyProjection<In, Out>, TrailmapTypesError>
    where
        In: NewGeoPoint<f64>,
        Out: NewCartesianPoint2d<f64>,
    {
        GeodesyProjection::new(&self.definition)
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}
