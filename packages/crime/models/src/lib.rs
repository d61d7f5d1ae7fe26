#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record, coordinate, and reporting period types.
//!
//! These are the shapes every other crate in the workspace agrees on: the
//! [`IncidentRecord`] produced by the incident loader, the [`Coordinate`]
//! used for both queries and incident locations, and the
//! [`ReportingPeriod`] that scopes loading and aggregation.

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A (latitude, longitude) pair in the datasets' coordinate reference system.
///
/// No reprojection is ever applied. Conversion to a planar point goes
/// through an explicit [`AxisOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude and a longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are within their valid ranges
    /// (latitude in [-90, 90], longitude in [-180, 180]).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Which coordinate component becomes the geometry's x axis.
///
/// Must match the axis order of the boundary dataset. `GeoJSON` mandates
/// longitude first.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AxisOrder {
    /// x = longitude, y = latitude.
    #[default]
    LngLat,
    /// x = latitude, y = longitude.
    LatLng,
}

impl AxisOrder {
    /// Returns the `(x, y)` pair for a coordinate under this axis order.
    #[must_use]
    pub const fn xy(self, coordinate: Coordinate) -> (f64, f64) {
        match self {
            Self::LngLat => (coordinate.longitude, coordinate.latitude),
            Self::LatLng => (coordinate.latitude, coordinate.longitude),
        }
    }

    /// Returns the opposite axis order.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::LngLat => Self::LatLng,
            Self::LatLng => Self::LngLat,
        }
    }
}

/// Axis convention for incident coordinates, relative to the query point.
///
/// Incident exports have been seen with their latitude and longitude
/// columns reversed. `Swapped` compensates for such an export; `MatchQuery`
/// builds incident points exactly like query points.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentAxisOrder {
    /// Same axis order as the query point.
    #[default]
    MatchQuery,
    /// Opposite axis order to the query point.
    Swapped,
}

impl IncidentAxisOrder {
    /// Resolves the concrete axis order for incidents given the query's.
    #[must_use]
    pub const fn resolve(self, query: AxisOrder) -> AxisOrder {
        match self {
            Self::MatchQuery => query,
            Self::Swapped => query.swapped(),
        }
    }
}

/// Calendar months, named as they appear in the incident exports.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Month {
    /// January
    Enero = 1,
    /// February
    Febrero = 2,
    /// March
    Marzo = 3,
    /// April
    Abril = 4,
    /// May
    Mayo = 5,
    /// June
    Junio = 6,
    /// July
    Julio = 7,
    /// August
    Agosto = 8,
    /// September
    Septiembre = 9,
    /// October
    Octubre = 10,
    /// November
    Noviembre = 11,
    /// December
    Diciembre = 12,
}

impl Month {
    /// Returns the month number (1-12).
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Creates a month from its number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-12.
    pub const fn from_number(month: u32) -> Result<Self, InvalidPeriodError> {
        Ok(match month {
            1 => Self::Enero,
            2 => Self::Febrero,
            3 => Self::Marzo,
            4 => Self::Abril,
            5 => Self::Mayo,
            6 => Self::Junio,
            7 => Self::Julio,
            8 => Self::Agosto,
            9 => Self::Septiembre,
            10 => Self::Octubre,
            11 => Self::Noviembre,
            12 => Self::Diciembre,
            _ => return Err(InvalidPeriodError { year: 0, month }),
        })
    }
}

/// Error returned when a [`ReportingPeriod`] does not name a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPeriodError {
    /// The year that was provided.
    pub year: i32,
    /// The month that was provided.
    pub month: u32,
}

impl std::fmt::Display for InvalidPeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid reporting period {}-{:02}: expected month 1-12",
            self.year, self.month
        )
    }
}

impl std::error::Error for InvalidPeriodError {}

/// The calendar month over which incidents are loaded and aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod", into = "RawPeriod")]
pub struct ReportingPeriod {
    first_day: NaiveDate,
    month: Month,
}

#[derive(Serialize, Deserialize)]
struct RawPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawPeriod> for ReportingPeriod {
    type Error = InvalidPeriodError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl From<ReportingPeriod> for RawPeriod {
    fn from(period: ReportingPeriod) -> Self {
        Self {
            year: period.year(),
            month: period.month.number(),
        }
    }
}

impl Default for ReportingPeriod {
    /// December 2019, the period of the published incident snapshot.
    fn default() -> Self {
        Self {
            first_day: NaiveDate::from_ymd_opt(2019, 12, 1).unwrap_or_default(),
            month: Month::Diciembre,
        }
    }
}

impl ReportingPeriod {
    /// Creates the period for `month` (1-12) of `year`.
    ///
    /// # Errors
    ///
    /// Returns an error if the month is out of range or the year cannot be
    /// represented.
    pub fn new(year: i32, month: u32) -> Result<Self, InvalidPeriodError> {
        let err = InvalidPeriodError { year, month };
        let named = Month::from_number(month).map_err(|_| err)?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or(err)?;

        Ok(Self {
            first_day,
            month: named,
        })
    }

    /// Returns the calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Returns the month.
    #[must_use]
    pub const fn month(&self) -> Month {
        self.month
    }

    /// Returns the first day of the period.
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Returns every calendar day of the period, in order.
    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        self.first_day
            .iter_days()
            .take_while(|day| day.month() == self.first_day.month())
            .collect()
    }

    /// Returns the number of days in the period.
    #[must_use]
    pub fn len_days(&self) -> usize {
        self.days().len()
    }

    /// Returns `true` if `date` falls within the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.first_day.year() && date.month() == self.first_day.month()
    }

    /// Returns the zero-based position of `date` within [`Self::days`].
    #[must_use]
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date).then(|| date.day0() as usize)
    }

    /// Human-readable label, e.g. `"diciembre de 2019"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} de {}", self.month, self.year())
    }
}

impl std::fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month.number())
    }
}

/// One reported crime, as loaded from the incident export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Fine-grained offense label (e.g. "ROBO A TRANSEUNTE EN VIA PUBLICA").
    pub category: String,
    /// Coarse category the offense rolls up to.
    pub coarse_category: String,
    /// Where the incident occurred.
    pub coordinate: Coordinate,
    /// When the incident occurred.
    pub date: NaiveDate,
    /// Neighborhood name as reported by the source. Not authoritative:
    /// membership is recomputed from the coordinate.
    pub reported_neighborhood: String,
}
