#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-neighborhood incident aggregation.
//!
//! Re-derives neighborhood membership for every incident from its own
//! coordinate (the reported neighborhood field is not trusted), then
//! counts the members per fine category and builds a dense daily series
//! per coarse category across the catalog's reporting period.

use std::collections::BTreeMap;

use crime_bot_analytics_models::{
    Aggregation, AggregationResult, CategoryCount, CategorySeries, DailySeries,
};
use crime_bot_crime_models::{AxisOrder, Coordinate, IncidentRecord, ReportingPeriod};
use crime_bot_neighborhood_models::Neighborhood;
use crime_bot_source::incidents::IncidentCatalog;
use crime_bot_spatial::{contains, to_point};

/// Aggregates the incidents that lie within `neighborhood`.
///
/// `query` is the coordinate that resolved to the neighborhood; membership
/// is tested against each incident's own coordinate, converted with
/// `incident_axis`.
#[must_use]
pub fn aggregate(
    query: Coordinate,
    neighborhood: &Neighborhood,
    incidents: &IncidentCatalog,
    incident_axis: AxisOrder,
) -> Aggregation {
    let members: Vec<&IncidentRecord> = incidents
        .all()
        .iter()
        .filter(|incident| {
            contains(
                neighborhood.boundary(),
                &to_point(incident.coordinate, incident_axis),
            )
        })
        .collect();

    log::debug!(
        "{} of {} incidents lie within '{}' (query {query})",
        members.len(),
        incidents.len(),
        neighborhood.name()
    );

    if members.is_empty() {
        return Aggregation::Empty;
    }

    Aggregation::Counts(AggregationResult {
        total: members.len() as u64,
        by_category: count_by_category(&members),
        daily: daily_series(&members, incidents.period()),
    })
}

/// Counts incidents per fine category, in first-encountered order.
#[must_use]
pub fn count_by_category(incidents: &[&IncidentRecord]) -> Vec<CategoryCount> {
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for incident in incidents {
        let position = *positions
            .entry(incident.category.as_str())
            .or_insert_with(|| {
                counts.push(CategoryCount {
                    category: incident.category.clone(),
                    count: 0,
                });
                counts.len() - 1
            });
        counts[position].count += 1;
    }

    counts
}

/// Builds zero-filled per-day counts for each coarse category present in
/// `incidents`. Incidents dated outside `period` are not plotted.
#[must_use]
pub fn daily_series(incidents: &[&IncidentRecord], period: ReportingPeriod) -> DailySeries {
    let days = period.days();
    let mut positions: BTreeMap<&str, usize> = BTreeMap::new();
    let mut series: Vec<CategorySeries> = Vec::new();

    for incident in incidents {
        let position = *positions
            .entry(incident.coarse_category.as_str())
            .or_insert_with(|| {
                series.push(CategorySeries {
                    category: incident.coarse_category.clone(),
                    counts: vec![0; days.len()],
                });
                series.len() - 1
            });

        if let Some(day) = period.day_index(incident.date) {
            series[position].counts[day] += 1;
        }
    }

    DailySeries { days, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use geo::{MultiPolygon, polygon};

    const ROMA_NORTE_QUERY: Coordinate = Coordinate {
        latitude: 19.42,
        longitude: -99.16,
    };

    fn roma_norte() -> Neighborhood {
        let poly = polygon![
            (x: -99.17, y: 19.41),
            (x: -99.15, y: 19.41),
            (x: -99.15, y: 19.43),
            (x: -99.17, y: 19.43),
            (x: -99.17, y: 19.41),
        ];
        Neighborhood::new("Roma Norte", MultiPolygon(vec![poly]))
    }

    fn incident(category: &str, coarse: &str, day: u32, lat: f64, lng: f64) -> IncidentRecord {
        IncidentRecord {
            category: category.to_string(),
            coarse_category: coarse.to_string(),
            coordinate: Coordinate::new(lat, lng),
            date: NaiveDate::from_ymd_opt(2019, 12, day).unwrap(),
            reported_neighborhood: "ROMA NORTE".to_string(),
        }
    }

    fn catalog(records: Vec<IncidentRecord>) -> IncidentCatalog {
        IncidentCatalog::from_records(records, ReportingPeriod::default())
    }

    fn scenario() -> IncidentCatalog {
        let mut records = Vec::new();
        for day in [1, 1, 5, 20, 31] {
            records.push(incident("Robo", "ROBO", day, 19.42, -99.16));
        }
        for day in [2, 5, 5] {
            records.push(incident("Fraude", "FRAUDE", day, 19.415, -99.165));
        }
        // Outside the neighborhood despite the reported name.
        records.push(incident("Robo", "ROBO", 3, 19.50, -99.30));
        catalog(records)
    }

    fn counts(aggregation: &Aggregation) -> &AggregationResult {
        aggregation.result().expect("expected counts")
    }

    #[test]
    fn counts_categories_in_first_encountered_order() {
        let aggregation = aggregate(ROMA_NORTE_QUERY, &roma_norte(), &scenario(), AxisOrder::LngLat);
        let result = counts(&aggregation);

        assert_eq!(
            result.by_category,
            vec![
                CategoryCount {
                    category: "Robo".to_string(),
                    count: 5
                },
                CategoryCount {
                    category: "Fraude".to_string(),
                    count: 3
                },
            ]
        );
        assert_eq!(result.total, 8);
        assert_eq!(
            result.by_category.iter().map(|c| c.count).sum::<u64>(),
            result.total
        );
    }

    #[test]
    fn first_encountered_order_follows_input_order() {
        let records = vec![
            incident("Fraude", "FRAUDE", 1, 19.42, -99.16),
            incident("Robo", "ROBO", 1, 19.42, -99.16),
            incident("Fraude", "FRAUDE", 2, 19.42, -99.16),
        ];
        let aggregation =
            aggregate(ROMA_NORTE_QUERY, &roma_norte(), &catalog(records), AxisOrder::LngLat);
        let labels: Vec<&str> = counts(&aggregation)
            .by_category
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(labels, ["Fraude", "Robo"]);
    }

    #[test]
    fn daily_series_is_dense() {
        let aggregation = aggregate(ROMA_NORTE_QUERY, &roma_norte(), &scenario(), AxisOrder::LngLat);
        let daily = &counts(&aggregation).daily;

        assert_eq!(daily.days.len(), 31);
        assert_eq!(daily.series.len(), 2);
        for series in &daily.series {
            assert_eq!(series.counts.len(), 31);
        }

        let robo = daily.get("ROBO").unwrap();
        assert_eq!(robo.counts[0], 2);
        assert_eq!(robo.counts[1], 0);
        assert_eq!(robo.counts[4], 1);
        assert_eq!(robo.counts[30], 1);
        assert_eq!(robo.total(), 5);

        let fraude = daily.get("FRAUDE").unwrap();
        assert_eq!(fraude.counts[4], 2);
        assert_eq!(fraude.total(), 3);
        assert_eq!(daily.peak(), 2);
    }

    #[test]
    fn no_members_is_empty() {
        let records = vec![incident("Robo", "ROBO", 3, 19.50, -99.30)];
        let aggregation =
            aggregate(ROMA_NORTE_QUERY, &roma_norte(), &catalog(records), AxisOrder::LngLat);
        assert_eq!(aggregation, Aggregation::Empty);

        let aggregation =
            aggregate(ROMA_NORTE_QUERY, &roma_norte(), &catalog(Vec::new()), AxisOrder::LngLat);
        assert!(aggregation.is_empty());
    }

    #[test]
    fn incident_axis_order_controls_membership() {
        // Exported with latitude and longitude columns reversed.
        let records = vec![incident("Robo", "ROBO", 3, -99.16, 19.42)];
        let incidents = catalog(records);

        let matched = aggregate(ROMA_NORTE_QUERY, &roma_norte(), &incidents, AxisOrder::LngLat);
        assert!(matched.is_empty());

        let swapped = aggregate(ROMA_NORTE_QUERY, &roma_norte(), &incidents, AxisOrder::LatLng);
        assert_eq!(counts(&swapped).total, 1);
    }

    #[test]
    fn series_ignores_out_of_period_dates() {
        let mut stray = incident("Robo", "ROBO", 1, 19.42, -99.16);
        stray.date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let members = [&stray];
        let daily = daily_series(&members, ReportingPeriod::default());
        assert_eq!(daily.series.len(), 1);
        assert_eq!(daily.series[0].total(), 0);
    }
}
