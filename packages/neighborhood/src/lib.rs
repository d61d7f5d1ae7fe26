#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundary loading and normalization.
//!
//! Reads the colonia boundary dataset (a `GeoJSON` `FeatureCollection`)
//! once at startup, drops features without a usable geometry, and holds the
//! rest in dataset order as an immutable [`catalog::PolygonCatalog`].

pub mod catalog;
pub mod normalize;

pub use catalog::{BoundaryLoadStats, PolygonCatalog};
