use crate::cartesian::NewCartesianPoint2d;
use crate::error::TrailmapTypesError;
use crate::geo::traits::point::NewGeoPoint;
use crate::geo::traits::projection::Projection;
use ::geodesy::prelude::*;
use std::marker::PhantomData;

/// Projection backed by an operator of the [`geodesy`] crate.
///
/// Input points are geographic (degrees), output points are in the units of the operator
/// (meters for all the map projections geodesy provides).
pub struct GeodesyProjection<In, Out> {
    ctx: Minimal,
    handle: OpHandle,
    points: PhantomData<(In, Out)>,
}

impl<In, Out> GeodesyProjection<In, Out> {
    /// Creates a projection from a geodesy operator definition, e.g. `utm zone=32`.
    pub fn new(definition: &str) -> Result<Self, TrailmapTypesError> {
        let mut ctx = Minimal::new();
        let handle = ctx
            .op(definition)
            .map_err(|err| TrailmapTypesError::InvalidDefinition {
                definition: definition.to_string(),
                reason: err.to_string(),
            })?;

        Ok(Self {
            ctx,
            handle,
            points: PhantomData,
        })
    }

    /// Runs the operator over a single coordinate pair. Non-finite results mean the point is
    /// outside of the operator domain.
    fn transform(&self, direction: Direction, a: f64, b: f64) -> Option<(f64, f64)> {
        let mut buf = [Coor2D([a, b])];
        self.ctx.apply(self.handle, direction, &mut buf).ok()?;

        let [first, second] = buf[0].0;
        (first.is_finite() && second.is_finite()).then_some((first, second))
    }
}

impl<In: NewGeoPoint<f64>, Out: NewCartesianPoint2d<f64>> Projection
    for GeodesyProjection<In, Out>
{
    type InPoint = In;
    type OutPoint = Out;

    fn project(&self, input: &In) -> Option<Out> {
        let (x, y) = self.transform(Fwd, input.lon_rad(), input.lat_rad())?;
        Some(Out::new(x, y))
    }

    fn unproject(&self, input: &Out) -> Option<In> {
        let (lon, lat) = self.transform(Inv, input.x(), input.y())?;
        Some(In::lonlat(lon.to_degrees(), lat.to_degrees()))
    }
}
