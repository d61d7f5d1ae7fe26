//! The polygon catalog: every neighborhood boundary, in dataset order.
//!
//! Dataset order matters. When boundaries overlap, the resolver returns
//! the first match, so the catalog never reorders what it loads.

use std::collections::BTreeSet;
use std::io::Read;

use crime_bot_neighborhood_models::{BoundarySource, Neighborhood};
use crime_bot_source::DataLoadError;

use crate::normalize::{FeatureOutcome, normalize_feature};

/// Per-load feature accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryLoadStats {
    /// Features in the collection.
    pub features: u64,
    /// Features kept in the catalog.
    pub retained: u64,
    /// Features with a `null` or absent geometry.
    pub null_geometry: u64,
    /// Features without a name or with a non-polygon geometry.
    pub skipped: u64,
}

/// Read-only, ordered collection of neighborhood boundaries.
#[derive(Debug, Clone, Default)]
pub struct PolygonCatalog {
    neighborhoods: Vec<Neighborhood>,
    stats: BoundaryLoadStats,
}

impl PolygonCatalog {
    /// Loads the catalog from the source's `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file cannot be read or is not a
    /// `GeoJSON` `FeatureCollection`.
    pub fn load(source: &BoundarySource) -> Result<Self, DataLoadError> {
        log::info!("Loading neighborhood boundaries from {}", source.path.display());
        let file =
            std::fs::File::open(&source.path).map_err(|e| DataLoadError::io(&source.path, e))?;
        Self::from_reader(std::io::BufReader::new(file), source)
    }

    /// Loads the catalog from any reader producing a `FeatureCollection`.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the input is not valid JSON or not a
    /// `FeatureCollection`.
    pub fn from_reader<R: Read>(reader: R, source: &BoundarySource) -> Result<Self, DataLoadError> {
        let document: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_value(&document, source)
    }

    /// Loads the catalog from an in-memory `FeatureCollection` string.
    ///
    /// # Errors
    ///
    /// See [`Self::from_reader`].
    pub fn from_geojson_str(geojson: &str, source: &BoundarySource) -> Result<Self, DataLoadError> {
        Self::from_reader(geojson.as_bytes(), source)
    }

    fn from_value(document: &serde_json::Value, source: &BoundarySource) -> Result<Self, DataLoadError> {
        let kind = document.get("type").and_then(serde_json::Value::as_str);
        if kind != Some("FeatureCollection") {
            return Err(DataLoadError::Malformed {
                message: format!(
                    "expected a GeoJSON FeatureCollection, found {}",
                    kind.unwrap_or("no type")
                ),
            });
        }

        let features = document
            .get("features")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| DataLoadError::MissingField {
                field: "features".to_string(),
            })?;

        let mut stats = BoundaryLoadStats {
            features: features.len() as u64,
            ..BoundaryLoadStats::default()
        };
        let mut neighborhoods = Vec::with_capacity(features.len());

        for (idx, feature) in features.iter().enumerate() {
            match normalize_feature(feature, source) {
                FeatureOutcome::Retained(nbhd) => neighborhoods.push(nbhd),
                FeatureOutcome::NullGeometry => stats.null_geometry += 1,
                FeatureOutcome::MissingName => {
                    log::warn!(
                        "Skipping boundary feature {idx}: no '{}' property",
                        source.name_field
                    );
                    stats.skipped += 1;
                }
                FeatureOutcome::Unusable { reason } => {
                    log::warn!("Skipping boundary feature {idx}: {reason}");
                    stats.skipped += 1;
                }
            }
        }

        stats.retained = neighborhoods.len() as u64;
        warn_duplicate_names(&neighborhoods);

        log::info!(
            "Loaded {} neighborhoods ({} features, {} null geometries, {} skipped)",
            stats.retained,
            stats.features,
            stats.null_geometry,
            stats.skipped,
        );

        Ok(Self {
            neighborhoods,
            stats,
        })
    }

    /// Builds a catalog from already-constructed neighborhoods, keeping
    /// their order.
    #[must_use]
    pub fn from_neighborhoods(neighborhoods: Vec<Neighborhood>) -> Self {
        let count = neighborhoods.len() as u64;
        Self {
            neighborhoods,
            stats: BoundaryLoadStats {
                features: count,
                retained: count,
                ..BoundaryLoadStats::default()
            },
        }
    }

    /// All retained neighborhoods, in dataset order.
    #[must_use]
    pub fn all(&self) -> &[Neighborhood] {
        &self.neighborhoods
    }

    /// Looks up a neighborhood by exact name. Returns the first in
    /// catalog order when names repeat.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Neighborhood> {
        self.neighborhoods.iter().find(|n| n.name() == name)
    }

    /// Feature accounting from the load.
    #[must_use]
    pub const fn stats(&self) -> &BoundaryLoadStats {
        &self.stats
    }

    /// Number of neighborhoods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighborhoods.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighborhoods.is_empty()
    }
}

fn warn_duplicate_names(neighborhoods: &[Neighborhood]) {
    let mut seen = BTreeSet::new();
    for nbhd in neighborhoods {
        if !seen.insert(nbhd.name()) {
            log::warn!(
                "Duplicate neighborhood name '{}': the first in dataset order wins on overlap",
                nbhd.name()
            );
        }
    }
}
