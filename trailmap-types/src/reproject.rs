use geo::MapCoords;
use geo_types::Coord;

use crate::error::TrailmapTypesError;
use crate::geo::Projection;

/// Reprojection of `geo_types` geometries.
///
/// Implemented for every geometry that can map its coordinates, so it works for single
/// geometries (`LineString`, `Polygon`, ...) as well as for the `Geometry` enum.
pub trait Reproject {
    /// Type of the reprojected geometry.
    type Output;

    /// Projects every coordinate of the geometry with the given `projection`.
    ///
    /// Fails on the first coordinate that is outside of the projection domain.
    fn reproject<P>(&self, projection: &P) -> Result<Self::Output, TrailmapTypesError>
    where
        P: Projection<InPoint = Coord, OutPoint = Coord> + ?Sized;

    /// Inverse of [`Reproject::reproject`]: converts projected coordinates back.
    fn unproject<P>(&self, projection: &P) -> Result<Self::Output, TrailmapTypesError>
    where
        P: Projection<InPoint = Coord, OutPoint = Coord> + ?Sized;
}

impl<G> Reproject for G
where
    G: MapCoords<f64, f64>,
{
    type Output = G::Output;

    fn reproject<P>(&self, projection: &P) -> Result<Self::Output, TrailmapTypesError>
    where
        P: Projection<InPoint = Coord, OutPoint = Coord> + ?Sized,
    {
        self.try_map_coords(|coord| {
            projection
                .project(&coord)
                .ok_or(TrailmapTypesError::Projection {
                    x: coord.x,
                    y: coord.y,
                })
        })
    }

    fn unproject<P>(&self, projection: &P) -> Result<Self::Output, TrailmapTypesError>
    where
        P: Projection<InPoint = Coord, OutPoint = Coord> + ?Sized,
    {
        self.try_map_coords(|coord| {
            projection
                .unproject(&coord)
                .ok_or(TrailmapTypesError::Projection {
                    x: coord.x,
                    y: coord.y,
                })
        })
    }
}
