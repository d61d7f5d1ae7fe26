#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The crime report service.
//!
//! [`CrimeService`] loads both catalogs once and answers coordinate
//! queries against them. It holds no mutable state, so a single instance
//! can serve any number of concurrent callers.

pub mod config;

use std::sync::Arc;

use crime_bot_analytics::aggregate;
use crime_bot_analytics_models::Aggregation;
use crime_bot_crime_models::{AxisOrder, Coordinate};
use crime_bot_neighborhood::PolygonCatalog;
use crime_bot_report::{format_report, no_incidents_message, no_neighborhood_message, render_chart};
use crime_bot_source::DataLoadError;
use crime_bot_source::incidents::IncidentCatalog;
use crime_bot_source::progress::{ProgressCallback, null_progress};
use crime_bot_spatial::{NeighborhoodResolver, Resolution};

pub use config::{ConfigError, GeometrySettings, ReportSettings, ServiceConfig};
pub use crime_bot_report::ImageArtifact;

/// Errors that can occur while starting the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The configuration could not be read or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A boundary or incident dataset failed to load.
    #[error(transparent)]
    Data(#[from] DataLoadError),
}

/// Result of a coordinate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The coordinate is outside every neighborhood.
    NotFound { text: String },
    /// The neighborhood has no incidents in the period.
    Empty { neighborhood: String, text: String },
    /// Counts without a chart (charts disabled, or rendering failed).
    Report { neighborhood: String, text: String },
    /// Counts with the daily-series chart.
    ReportWithChart {
        neighborhood: String,
        text: String,
        chart: ImageArtifact,
    },
}

impl QueryOutcome {
    /// The text to send back to the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::NotFound { text }
            | Self::Empty { text, .. }
            | Self::Report { text, .. }
            | Self::ReportWithChart { text, .. } => text,
        }
    }

    /// The resolved neighborhood, if any.
    #[must_use]
    pub fn neighborhood(&self) -> Option<&str> {
        match self {
            Self::NotFound { .. } => None,
            Self::Empty { neighborhood, .. }
            | Self::Report { neighborhood, .. }
            | Self::ReportWithChart { neighborhood, .. } => Some(neighborhood),
        }
    }

    #[must_use]
    pub const fn chart(&self) -> Option<&ImageArtifact> {
        match self {
            Self::ReportWithChart { chart, .. } => Some(chart),
            _ => None,
        }
    }
}

/// Owns the catalogs and configuration for the life of the process.
#[derive(Debug)]
pub struct CrimeService {
    config: ServiceConfig,
    resolver: NeighborhoodResolver,
    incidents: IncidentCatalog,
    incident_axis: AxisOrder,
}

impl CrimeService {
    /// Loads both datasets named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if either dataset cannot be loaded.
    pub fn load(config: ServiceConfig) -> Result<Self, ServiceError> {
        Self::load_with_progress(config, &null_progress())
    }

    /// Like [`Self::load`], reporting incident rows read to `progress`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_progress(
        config: ServiceConfig,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, ServiceError> {
        let boundaries = PolygonCatalog::load(&config.boundaries)?;
        let incidents =
            IncidentCatalog::load_with_progress(&config.incidents, config.period, progress)?;
        Ok(Self::from_parts(config, boundaries, incidents))
    }

    /// Builds the service from catalogs that are already loaded.
    ///
    /// Reports cover the incident catalog's period.
    #[must_use]
    pub fn from_parts(
        config: ServiceConfig,
        boundaries: PolygonCatalog,
        incidents: IncidentCatalog,
    ) -> Self {
        if incidents.period() != config.period {
            log::warn!(
                "Incident catalog covers {} but config names {}; reporting {}",
                incidents.period(),
                config.period,
                incidents.period()
            );
        }

        let geometry = config.geometry;
        let resolver = NeighborhoodResolver::new(
            boundaries,
            geometry.resolver,
            geometry.query_axis_order,
        );

        log::info!(
            "Service ready: {} neighborhoods, {} incidents for {} ({} resolver, {} incident axes)",
            resolver.catalog().len(),
            incidents.len(),
            incidents.period().label(),
            geometry.resolver,
            geometry.incident_axis_order,
        );

        Self {
            config,
            resolver,
            incidents,
            incident_axis: geometry.incident_axis(),
        }
    }

    /// Answers a coordinate query.
    #[must_use]
    pub fn query(&self, coordinate: Coordinate) -> QueryOutcome {
        let Resolution::Found(neighborhood) = self.resolver.resolve(coordinate) else {
            return QueryOutcome::NotFound {
                text: no_neighborhood_message().to_string(),
            };
        };

        let period = self.incidents.period();
        let name = neighborhood.name().to_string();

        let result = match aggregate(coordinate, neighborhood, &self.incidents, self.incident_axis)
        {
            Aggregation::Empty => {
                return QueryOutcome::Empty {
                    neighborhood: name,
                    text: no_incidents_message(&period),
                };
            }
            Aggregation::Counts(result) => result,
        };

        let report = &self.config.report;
        let text = format_report(&name, &result, &period, report.markup);

        if !report.chart {
            return QueryOutcome::Report {
                neighborhood: name,
                text,
            };
        }

        match render_chart(&result.daily, &name, &period, &report.chart_options()) {
            Ok(chart) => QueryOutcome::ReportWithChart {
                neighborhood: name,
                text,
                chart,
            },
            Err(e) => {
                log::warn!("Chart rendering failed for '{name}', sending text only: {e}");
                QueryOutcome::Report {
                    neighborhood: name,
                    text,
                }
            }
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The neighborhood boundaries, in catalog order.
    #[must_use]
    pub const fn neighborhoods(&self) -> &PolygonCatalog {
        self.resolver.catalog()
    }

    #[must_use]
    pub const fn incidents(&self) -> &IncidentCatalog {
        &self.incidents
    }
}
