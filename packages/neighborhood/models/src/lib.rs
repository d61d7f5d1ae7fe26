#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood boundary source definition and catalog entry types.
//!
//! Defines the TOML schema for the boundary dataset and the
//! [`Neighborhood`] record the polygon catalog holds after loading.

use std::path::PathBuf;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// The neighborhood boundary dataset, deserialized from the `[boundaries]`
/// table of the service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySource {
    /// Path to a `GeoJSON` `FeatureCollection`.
    pub path: PathBuf,
    /// Property field containing the neighborhood name.
    #[serde(default = "default_name_field")]
    pub name_field: String,
    /// How to extract polygon geometry from each feature.
    #[serde(default)]
    pub geometry: GeometryExtractor,
}

fn default_name_field() -> String {
    "COLONIA".to_string()
}

impl BoundarySource {
    /// Creates a source with the default name field and geometry format.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name_field: default_name_field(),
            geometry: GeometryExtractor::default(),
        }
    }
}

/// How to extract polygon geometry from a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryExtractor {
    /// Geometry is already a standard `GeoJSON` object.
    #[default]
    Geojson,
    /// Geometry uses Esri JSON format (`{ "rings": [...] }`), needs
    /// conversion to `GeoJSON`.
    EsriRings,
}

/// An administrative neighborhood (colonia) and its boundary.
///
/// Immutable once loaded. The boundary is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    name: String,
    boundary: MultiPolygon<f64>,
}

impl Neighborhood {
    /// Creates a neighborhood from a name and a boundary.
    #[must_use]
    pub fn new(name: impl Into<String>, boundary: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            boundary,
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary polygons, holes included.
    #[must_use]
    pub const fn boundary(&self) -> &MultiPolygon<f64> {
        &self.boundary
    }
}
