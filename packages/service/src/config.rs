//! Service configuration, deserialized from TOML.
//!
//! A default configuration is embedded at compile time; a file given on
//! the command line replaces it wholesale. Relative dataset paths in a
//! config file are resolved against the file's directory.

use std::path::{Path, PathBuf};

use crime_bot_crime_models::{AxisOrder, IncidentAxisOrder, ReportingPeriod};
use crime_bot_neighborhood_models::BoundarySource;
use crime_bot_report::{ChartOptions, ReportMarkup};
use crime_bot_source::source_def::IncidentSource;
use crime_bot_spatial::ResolverStrategy;
use serde::{Deserialize, Serialize};

/// The configuration baked into the binary.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors that can occur while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        source: std::io::Error,
    },

    /// The TOML is malformed or does not match the schema (this includes
    /// an out-of-range reporting period).
    #[error("Invalid config {origin}: {source}")]
    Parse {
        /// File path, or `<embedded>` for the built-in default.
        origin: String,
        source: toml::de::Error,
    },

    /// A value parsed but is not usable.
    #[error("Invalid config value for '{key}': {message}")]
    Invalid { key: &'static str, message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Calendar month incidents are loaded and reported for.
    #[serde(default)]
    pub period: ReportingPeriod,
    /// Neighborhood boundary dataset.
    pub boundaries: BoundarySource,
    /// Incident dataset.
    pub incidents: IncidentSource,
    #[serde(default)]
    pub geometry: GeometrySettings,
    #[serde(default)]
    pub report: ReportSettings,
}

/// Axis conventions and lookup strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySettings {
    /// How query coordinates map onto the boundary dataset's axes.
    pub query_axis_order: AxisOrder,
    /// How incident coordinates relate to the query's axis order.
    pub incident_axis_order: IncidentAxisOrder,
    pub resolver: ResolverStrategy,
}

impl GeometrySettings {
    /// Concrete axis order for incident coordinates.
    #[must_use]
    pub const fn incident_axis(&self) -> AxisOrder {
        self.incident_axis_order.resolve(self.query_axis_order)
    }
}

/// Report output settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub markup: ReportMarkup,
    /// Whether to render a chart alongside the text report.
    pub chart: bool,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let chart = ChartOptions::default();
        Self {
            markup: ReportMarkup::default(),
            chart: true,
            chart_width: chart.width,
            chart_height: chart.height,
        }
    }
}

impl ReportSettings {
    #[must_use]
    pub const fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            width: self.chart_width,
            height: self.chart_height,
        }
    }
}

impl ServiceConfig {
    /// Parses the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Only if the embedded file is invalid, which the tests rule out.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CONFIG, "<embedded>")
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed, does not match the
    /// schema, or holds an unusable value.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::parse(toml, "<string>")
    }

    /// Reads configuration from a file, resolving relative dataset paths
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents, &path.display().to_string())?;

        if let Some(dir) = path.parent() {
            config.boundaries.path = rebase(dir, &config.boundaries.path);
            config.incidents.path = rebase(dir, &config.incidents.path);
        }

        Ok(config)
    }

    /// Replaces the boundary dataset path.
    #[must_use]
    pub fn with_boundaries_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.boundaries.path = path.into();
        self
    }

    /// Replaces the incident dataset path.
    #[must_use]
    pub fn with_incidents_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.incidents.path = path.into();
        self
    }

    fn parse(toml: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.boundaries.name_field.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "boundaries.name_field",
                message: "must not be empty".to_string(),
            });
        }
        if let Some(delimiter) = &self.incidents.delimiter
            && delimiter.len() != 1
        {
            return Err(ConfigError::Invalid {
                key: "incidents.delimiter",
                message: format!("expected a single ASCII character, got '{delimiter}'"),
            });
        }
        if self.report.chart && (self.report.chart_width == 0 || self.report.chart_height == 0) {
            return Err(ConfigError::Invalid {
                key: "report.chart_width",
                message: "chart dimensions must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn rebase(dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && !dir.as_os_str().is_empty() {
        dir.join(path)
    } else {
        path.to_path_buf()
    }
}
