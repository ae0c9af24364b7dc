//! Points in geographic coordinates (latitude and longitude) (see [`GeoPoint`]) and their
//! conversion into projected coordinate systems (see [`Projection`] and [`Crs`]).

mod crs;
pub mod impls;
mod traits;

pub use crs::Crs;
pub use traits::point::{GeoPoint, NewGeoPoint};
pub use traits::projection::Projection;
