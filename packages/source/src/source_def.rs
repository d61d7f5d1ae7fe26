//! Incident dataset definition, deserialized from the `[incidents]` table
//! of the service configuration.
//!
//! Field names default to the column names of the Mexico City
//! "carpetas de investigación" export, so a config only needs a `path`
//! unless the export differs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where to read incidents from and how to interpret the columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentSource {
    /// Path to the CSV export.
    pub path: PathBuf,
    /// Field delimiter (default: comma).
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Column mapping.
    #[serde(default)]
    pub fields: IncidentFieldMapping,
}

impl IncidentSource {
    /// Creates a source with the default column mapping.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: None,
            fields: IncidentFieldMapping::default(),
        }
    }

    /// Returns the delimiter byte, falling back to `,`.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
            .unwrap_or(b',')
    }
}

/// Column names for each incident attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentFieldMapping {
    /// Fine-grained offense label.
    pub category: String,
    /// Coarse offense category.
    pub coarse_category: String,
    /// Latitude column.
    pub latitude: String,
    /// Longitude column.
    pub longitude: String,
    /// Occurrence date (or date-time) column.
    pub date: String,
    /// Reported neighborhood name column.
    pub neighborhood: String,
    /// Optional month-name column (e.g. `"Diciembre"`). When set, records
    /// must also match the reporting month on this column.
    pub month_field: Option<String>,
    /// Optional year column. When set, records must also match the
    /// reporting year on this column.
    pub year_field: Option<String>,
}

impl Default for IncidentFieldMapping {
    fn default() -> Self {
        Self {
            category: "delito".to_string(),
            coarse_category: "categoria_delito".to_string(),
            latitude: "latitud".to_string(),
            longitude: "longitud".to_string(),
            date: "fecha_hechos".to_string(),
            neighborhood: "colonia_hechos".to_string(),
            month_field: None,
            year_field: None,
        }
    }
}
