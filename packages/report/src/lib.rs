#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report formatting and chart rendering.
//!
//! Turns an aggregation into the text block sent back to the user and,
//! when there is a daily series, a line chart. Both are produced in
//! memory; nothing here touches the filesystem.

pub mod chart;
pub mod text;

pub use chart::{ChartOptions, ImageArtifact, render_chart};
pub use text::{ReportMarkup, format_report, no_incidents_message, no_neighborhood_message};

/// Errors that can occur while rendering a chart.
///
/// Never fatal to a query: callers fall back to the text report.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The series has no categories to plot.
    #[error("Nothing to plot: the daily series has no categories")]
    NoSeries,

    /// The series covers no days.
    #[error("Nothing to plot: the daily series covers no days")]
    NoDays,

    /// A series does not have one count per day.
    #[error("Series '{category}' has {actual} points, expected {expected}")]
    MisalignedSeries {
        /// Coarse category of the offending series.
        category: String,
        /// Number of days in the period.
        expected: usize,
        /// Number of counts in the series.
        actual: usize,
    },

    /// The requested canvas is too small to hold the plot.
    #[error("Invalid chart dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Writing the document failed.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}
