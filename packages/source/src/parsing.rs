//! Field parsing for incident export rows.
//!
//! Date and coordinate columns arrive as free text and in several shapes
//! depending on how the export was produced.

use chrono::{NaiveDate, NaiveDateTime};
use crime_bot_crime_models::Coordinate;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parses the occurrence date of an incident. Time of day is discarded.
#[must_use]
pub fn parse_incident_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

/// Parses lat/lng text fields. Returns `None` if either is missing,
/// unparseable, non-finite, or zero.
#[must_use]
pub fn parse_coordinate(lat: &str, lng: &str) -> Option<Coordinate> {
    let latitude = lat.trim().parse::<f64>().ok()?;
    let longitude = lng.trim().parse::<f64>().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    Some(Coordinate::new(latitude, longitude))
}

/// Parses a year column, tolerating the `2019.0` form spreadsheet tools
/// write for integer columns with gaps.
#[must_use]
pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(year) = s.parse::<i32>() {
        return Some(year);
    }
    let value = s.parse::<f64>().ok()?;
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value as i32)
}
