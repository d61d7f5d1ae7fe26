#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation result types for neighborhood incident reports.
//!
//! Everything here is query-scoped: built by the aggregator for one
//! neighborhood, rendered by the report formatter, then dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Incident count for one category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category label as it appears in the dataset.
    pub category: String,
    /// Number of incidents.
    pub count: u64,
}

/// Daily counts for one coarse category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySeries {
    /// Coarse category label.
    pub category: String,
    /// One count per day of the period, aligned with [`DailySeries::days`].
    pub counts: Vec<u64>,
}

impl CategorySeries {
    /// Sum over all days.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest single-day count.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Dense per-day counts across a reporting period, one series per coarse
/// category. Every series has exactly one entry per day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    /// Every calendar day of the period, in order.
    pub days: Vec<NaiveDate>,
    /// One series per coarse category, in first-encountered order.
    pub series: Vec<CategorySeries>,
}

impl DailySeries {
    /// Returns the series for a coarse category.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&CategorySeries> {
        self.series.iter().find(|s| s.category == category)
    }

    /// Largest single-day count across every series.
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.series.iter().map(CategorySeries::peak).max().unwrap_or(0)
    }

    /// Returns `true` if there are no series to plot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Counts for one neighborhood over the reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Number of incidents attributed to the neighborhood.
    pub total: u64,
    /// Counts per fine category, in first-encountered order.
    pub by_category: Vec<CategoryCount>,
    /// Dense daily counts per coarse category.
    pub daily: DailySeries,
}

/// What the aggregator found for a neighborhood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// No incident lies within the neighborhood.
    Empty,
    /// At least one incident lies within the neighborhood.
    Counts(AggregationResult),
}

impl Aggregation {
    /// Returns the counts, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&AggregationResult> {
        match self {
            Self::Empty => None,
            Self::Counts(result) => Some(result),
        }
    }

    /// Returns `true` for [`Aggregation::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
