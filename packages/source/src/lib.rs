#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident dataset loading and parsing.
//!
//! Reads the incident CSV export once at startup, keeps only the records
//! that fall inside the configured [`ReportingPeriod`] and carry a reported
//! neighborhood, and exposes them as an immutable [`IncidentCatalog`].
//!
//! Also home to [`DataLoadError`], shared by every dataset loader in the
//! workspace, and the [`progress::ProgressCallback`] trait loaders report
//! through.
//!
//! [`ReportingPeriod`]: crime_bot_crime_models::ReportingPeriod
//! [`IncidentCatalog`]: incidents::IncidentCatalog

pub mod incidents;
pub mod parsing;
pub mod progress;
pub mod source_def;

use std::path::{Path, PathBuf};

/// Errors that can occur while loading a dataset.
///
/// Every variant is fatal at startup: no query can be answered without
/// both catalogs.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The dataset file could not be opened or read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column or property the field mapping names is absent.
    #[error("Missing field '{field}' in dataset")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// The dataset is structurally invalid.
    #[error("Malformed dataset: {message}")]
    Malformed {
        /// Description of what went wrong.
        message: String,
    },
}

impl DataLoadError {
    /// Wraps an I/O error with the path that produced it.
    #[must_use]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
