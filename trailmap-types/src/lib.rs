//! Geographic primitives shared by the `trailmap` crates.
//!
//! Geometries themselves are [`geo_types`] geometries; this
//! crate adds what is needed to measure them in real-world units:
//!
//! * [`Crs`](geo::Crs) - a coordinate reference system identified by its code (`EPSG:2774`) and
//!   described by an operator definition for the [`geodesy`] crate,
//! * [`Projection`](geo::Projection) - conversion between geographic and projected points, with
//!   [`GeodesyProjection`](geo::impls::projection::GeodesyProjection) doing the actual math,
//! * [`Reproject`] - reprojection of whole `geo_types` geometries.
//!
//! ```
//! use trailmap_types::geo::Crs;
//! use trailmap_types::Reproject;
//! use geo_types::{Coord, LineString};
//!
//! let projection = Crs::EPSG3395.get_projection::<Coord, Coord>()?;
//! let line = LineString::from(vec![(-107.9, 37.3), (-107.8, 37.3)]);
//! let projected = line.reproject(&projection)?;
//! assert!(projected.0[0].x < projected.0[1].x);
//! # Ok::<(), trailmap_types::error::TrailmapTypesError>(())
//! ```

pub mod cartesian;
pub mod error;
pub mod geo;
mod georust;
mod reproject;

pub use reproject::Reproject;
