//! Trailmap draws a map of an area and counts how many miles of trail there are in it.
//!
//! # Quick start
//!
//! ```no_run
//! use trailmap::{AreaOfInterest, FeatureLayersPayload, TrailMileageMapBuilder};
//!
//! let map = TrailMileageMapBuilder::new().build()?;
//! let report = map.create_and_save(
//!     &AreaOfInterest::place("Durango, Colorado, USA"),
//!     &FeatureLayersPayload::builtin()?,
//! )?;
//!
//! println!(
//!     "{:.3} miles of trail, measured in {}",
//!     report.mileage().miles(),
//!     report.crs()
//! );
//! # Ok::<(), trailmap::TrailmapError>(())
//! ```
//!
//! This fetches the default layers (highways, roads, streets, trails, parks, water and buildings)
//! from OpenStreetMap and writes `trail-mileage-maps/durango_colorado_usa-trails.svg`.
//!
//! # How it works
//!
//! A run is a straight pipeline, every stage consuming only the output of the previous one:
//!
//! * the [`area`] is resolved into a query polygon and its centroid, place names through a
//!   [`Geocoder`](provider::Geocoder),
//! * the [`catalog`] picks the first projected coordinate system whose coverage contains the
//!   centroid, falling back to World Mercator,
//! * [`fetch`] requests every layer of the [`FeatureLayersPayload`] from a
//!   [`MapDataProvider`](provider::MapDataProvider); one failing layer fails the run,
//! * the trail layer is reprojected and its lines are summed up in [`mileage`],
//! * the [`render`] module draws all the styled layers into an SVG figure titled with the result.
//!
//! The providers are traits, so every stage can be run against in-memory data.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod area;
pub mod catalog;
mod color;
pub mod config;
pub mod error;
pub mod fetch;
pub mod layer;
pub mod mileage;
mod pipeline;
pub mod provider;
pub mod render;

pub use area::{AreaOfInterest, BoundingBox};
pub use catalog::ProjectionCatalog;
pub use color::Color;
pub use config::Config;
pub use error::{Result, TrailmapError};
pub use layer::FeatureLayersPayload;
pub use pipeline::{TrailMileageMap, TrailMileageMapBuilder, TrailMileageReport};
pub use trailmap_types;
