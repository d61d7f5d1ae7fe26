//! The incident catalog: every reported crime in the reporting period.
//!
//! Loaded once from the CSV export and never mutated. Rows are dropped at
//! load time when they fall outside the period, have no reported
//! neighborhood, or cannot be placed on the map; the counts of each are
//! kept in [`LoadStats`].

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crime_bot_crime_models::{IncidentRecord, Month, ReportingPeriod};

use crate::DataLoadError;
use crate::parsing::{parse_coordinate, parse_incident_date, parse_year};
use crate::progress::{ProgressCallback, null_progress};
use crate::source_def::{IncidentFieldMapping, IncidentSource};

const PROGRESS_BATCH: u64 = 10_000;

/// Coarse category given to rows whose coarse column is blank.
pub const UNCATEGORIZED: &str = "SIN CATEGORIA";

/// Per-load row accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows read (header excluded).
    pub rows: u64,
    /// Rows kept in the catalog.
    pub retained: u64,
    /// Rows whose date (or month/year columns) fall outside the period.
    pub outside_period: u64,
    /// Rows with an empty reported-neighborhood field.
    pub missing_neighborhood: u64,
    /// Rows with an empty fine category.
    pub missing_category: u64,
    /// Rows whose coordinate is missing, zero, or unparseable.
    pub invalid_coordinate: u64,
    /// Rows whose date cannot be parsed.
    pub invalid_date: u64,
}

impl LoadStats {
    /// Total rows dropped for any reason.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.rows - self.retained
    }
}

/// Read-only collection of incidents for one reporting period.
#[derive(Debug, Clone)]
pub struct IncidentCatalog {
    records: Vec<IncidentRecord>,
    period: ReportingPeriod,
    stats: LoadStats,
}

impl IncidentCatalog {
    /// Loads the catalog from the source's CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file cannot be read, is not valid
    /// CSV, or lacks a column the field mapping requires.
    pub fn load(source: &IncidentSource, period: ReportingPeriod) -> Result<Self, DataLoadError> {
        Self::load_with_progress(source, period, &null_progress())
    }

    /// Like [`Self::load`], reporting rows read to `progress`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_progress(
        source: &IncidentSource,
        period: ReportingPeriod,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DataLoadError> {
        log::info!(
            "Loading incidents for {} from {}",
            period.label(),
            source.path.display()
        );
        let file = open(&source.path)?;
        Self::from_reader(file, source, period, progress)
    }

    /// Loads the catalog from any CSV reader.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the input is not valid CSV or lacks a
    /// required column.
    pub fn from_reader<R: Read>(
        reader: R,
        source: &IncidentSource,
        period: ReportingPeriod,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DataLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(source.delimiter_byte())
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::resolve(reader.headers()?, &source.fields)?;

        let mut records = Vec::new();
        let mut stats = LoadStats::default();
        let mut row = csv::StringRecord::new();

        while reader.read_record(&mut row)? {
            stats.rows += 1;
            if stats.rows % PROGRESS_BATCH == 0 {
                progress.inc(PROGRESS_BATCH);
            }

            match columns.parse(&row, period) {
                Ok(record) => records.push(record),
                Err(reason) => reason.count(&mut stats),
            }
        }

        progress.inc(stats.rows % PROGRESS_BATCH);
        stats.retained = records.len() as u64;

        log::info!(
            "Loaded {} incidents for {} ({} rows read, {} outside period, \
             {} without neighborhood, {} bad coordinates, {} bad dates, {} without category)",
            stats.retained,
            period.label(),
            stats.rows,
            stats.outside_period,
            stats.missing_neighborhood,
            stats.invalid_coordinate,
            stats.invalid_date,
            stats.missing_category,
        );
        progress.finish(format!("{} incidents loaded", stats.retained));

        Ok(Self {
            records,
            period,
            stats,
        })
    }

    /// Builds a catalog from already-parsed records, applying the same
    /// period and reported-neighborhood filters as the CSV loader.
    #[must_use]
    pub fn from_records(records: Vec<IncidentRecord>, period: ReportingPeriod) -> Self {
        let mut stats = LoadStats {
            rows: records.len() as u64,
            ..LoadStats::default()
        };

        let records: Vec<IncidentRecord> = records
            .into_iter()
            .filter(|record| {
                if !period.contains(record.date) {
                    stats.outside_period += 1;
                    false
                } else if record.reported_neighborhood.trim().is_empty() {
                    stats.missing_neighborhood += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        stats.retained = records.len() as u64;

        Self {
            records,
            period,
            stats,
        }
    }

    /// All retained incidents, in dataset order.
    #[must_use]
    pub fn all(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// The period the catalog was filtered to.
    #[must_use]
    pub const fn period(&self) -> ReportingPeriod {
        self.period
    }

    /// Row accounting from the load.
    #[must_use]
    pub const fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Number of retained incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no incidents were retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn open(path: &Path) -> Result<std::fs::File, DataLoadError> {
    std::fs::File::open(path).map_err(|e| DataLoadError::io(path, e))
}

/// Why a row was left out of the catalog.
enum SkipReason {
    OutsidePeriod,
    MissingNeighborhood,
    MissingCategory,
    InvalidCoordinate,
    InvalidDate,
}

impl SkipReason {
    fn count(&self, stats: &mut LoadStats) {
        match self {
            Self::OutsidePeriod => stats.outside_period += 1,
            Self::MissingNeighborhood => stats.missing_neighborhood += 1,
            Self::MissingCategory => stats.missing_category += 1,
            Self::InvalidCoordinate => stats.invalid_coordinate += 1,
            Self::InvalidDate => stats.invalid_date += 1,
        }
    }
}

/// Header positions of the mapped fields.
struct Columns {
    category: usize,
    coarse_category: usize,
    latitude: usize,
    longitude: usize,
    date: usize,
    neighborhood: usize,
    month: Option<usize>,
    year: Option<usize>,
}

impl Columns {
    fn resolve(
        headers: &csv::StringRecord,
        fields: &IncidentFieldMapping,
    ) -> Result<Self, DataLoadError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();

        if names.iter().all(|h| h.is_empty()) {
            return Err(DataLoadError::Malformed {
                message: "CSV file contains no header row".to_string(),
            });
        }

        let find = |field: &str| -> Result<usize, DataLoadError> {
            names
                .iter()
                .position(|h| *h == field)
                .ok_or_else(|| DataLoadError::MissingField {
                    field: field.to_string(),
                })
        };

        Ok(Self {
            category: find(fields.category.as_str())?,
            coarse_category: find(fields.coarse_category.as_str())?,
            latitude: find(fields.latitude.as_str())?,
            longitude: find(fields.longitude.as_str())?,
            date: find(fields.date.as_str())?,
            neighborhood: find(fields.neighborhood.as_str())?,
            month: fields.month_field.as_deref().map(find).transpose()?,
            year: fields.year_field.as_deref().map(find).transpose()?,
        })
    }

    fn parse(
        &self,
        row: &csv::StringRecord,
        period: ReportingPeriod,
    ) -> Result<IncidentRecord, SkipReason> {
        let get = |idx: usize| row.get(idx).unwrap_or("").trim();

        let date = parse_incident_date(get(self.date)).ok_or(SkipReason::InvalidDate)?;
        if !period.contains(date) {
            return Err(SkipReason::OutsidePeriod);
        }
        if let Some(idx) = self.month
            && get(idx).parse::<Month>().ok() != Some(period.month())
        {
            return Err(SkipReason::OutsidePeriod);
        }
        if let Some(idx) = self.year
            && parse_year(get(idx)) != Some(period.year())
        {
            return Err(SkipReason::OutsidePeriod);
        }

        let reported_neighborhood = get(self.neighborhood);
        if reported_neighborhood.is_empty() {
            return Err(SkipReason::MissingNeighborhood);
        }

        let category = get(self.category);
        if category.is_empty() {
            return Err(SkipReason::MissingCategory);
        }
        let coarse_category = match get(self.coarse_category) {
            "" => UNCATEGORIZED,
            coarse => coarse,
        };

        let coordinate = parse_coordinate(get(self.latitude), get(self.longitude))
            .ok_or(SkipReason::InvalidCoordinate)?;

        Ok(IncidentRecord {
            category: category.to_string(),
            coarse_category: coarse_category.to_string(),
            coordinate,
            date,
            reported_neighborhood: reported_neighborhood.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "ao_hechos,mes_hechos,fecha_hechos,delito,categoria_delito,colonia_hechos,longitud,latitud";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    fn load(data: &str, source: &IncidentSource) -> Result<IncidentCatalog, DataLoadError> {
        IncidentCatalog::from_reader(
            data.as_bytes(),
            source,
            ReportingPeriod::default(),
            &null_progress(),
        )
    }

    #[test]
    fn keeps_only_period_rows_with_neighborhood() {
        let data = csv(&[
            "2019,Diciembre,2019-12-03 10:00:00,ROBO A NEGOCIO,ROBO,ROMA NORTE,-99.16,19.41",
            "2019,Noviembre,2019-11-30 23:00:00,FRAUDE,FRAUDE,ROMA NORTE,-99.16,19.41",
            "2019,Diciembre,2019-12-04 10:00:00,FRAUDE,FRAUDE,,-99.16,19.41",
            "2019,Diciembre,2019-12-05 10:00:00,FRAUDE,FRAUDE,CONDESA,0,0",
            "2019,Diciembre,sin fecha,FRAUDE,FRAUDE,CONDESA,-99.17,19.41",
            "2019,Diciembre,2019-12-06 10:00:00,,FRAUDE,CONDESA,-99.17,19.41",
        ]);
        let catalog = load(&data, &IncidentSource::new("unused.csv")).unwrap();

        assert_eq!(catalog.len(), 1);
        let record = &catalog.all()[0];
        assert_eq!(record.category, "ROBO A NEGOCIO");
        assert_eq!(record.coarse_category, "ROBO");
        assert_eq!(record.reported_neighborhood, "ROMA NORTE");
        assert_eq!(record.date.to_string(), "2019-12-03");
        assert!((record.coordinate.latitude - 19.41).abs() < f64::EPSILON);
        assert!((record.coordinate.longitude - -99.16).abs() < f64::EPSILON);

        let stats = catalog.stats();
        assert_eq!(stats.rows, 6);
        assert_eq!(stats.retained, 1);
        assert_eq!(stats.outside_period, 1);
        assert_eq!(stats.missing_neighborhood, 1);
        assert_eq!(stats.invalid_coordinate, 1);
        assert_eq!(stats.invalid_date, 1);
        assert_eq!(stats.missing_category, 1);
        assert_eq!(stats.dropped(), 5);
    }

    #[test]
    fn month_and_year_columns_must_match_when_configured() {
        let data = csv(&[
            "2019,Diciembre,2019-12-03 10:00:00,ROBO,ROBO,ROMA NORTE,-99.16,19.41",
            "2018,Diciembre,2019-12-03 10:00:00,ROBO,ROBO,ROMA NORTE,-99.16,19.41",
            "2019.0,Enero,2019-12-03 10:00:00,ROBO,ROBO,ROMA NORTE,-99.16,19.41",
        ]);
        let mut source = IncidentSource::new("unused.csv");
        source.fields.month_field = Some("mes_hechos".to_string());
        source.fields.year_field = Some("ao_hechos".to_string());

        let catalog = load(&data, &source).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.stats().outside_period, 2);

        let unfiltered = load(&data, &IncidentSource::new("unused.csv")).unwrap();
        assert_eq!(unfiltered.len(), 3);
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "delito,categoria_delito,latitud,longitud,fecha_hechos\n";
        let err = load(data, &IncidentSource::new("unused.csv")).unwrap_err();
        assert!(
            matches!(err, DataLoadError::MissingField { ref field } if field == "colonia_hechos"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn strips_byte_order_mark_from_header() {
        let data = format!(
            "\u{feff}{}",
            csv(&["2019,Diciembre,2019-12-03,ROBO,ROBO,ROMA NORTE,-99.16,19.41"])
        );
        let catalog = load(&data, &IncidentSource::new("unused.csv")).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn blank_coarse_category_is_kept_as_uncategorized() {
        let data = csv(&[
            "2019,Diciembre,2019-12-03 10:00:00,ROBO A NEGOCIO,ROBO,ROMA NORTE,-99.16,19.41",
            "2019,Diciembre,2019-12-04 10:00:00,FRAUDE,,ROMA NORTE,-99.16,19.41",
        ]);
        let catalog = load(&data, &IncidentSource::new("unused.csv")).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.stats().missing_category, 0);
        let fraude = &catalog.all()[1];
        assert_eq!(fraude.category, "FRAUDE");
        assert_eq!(fraude.coarse_category, UNCATEGORIZED);
    }

    #[test]
    fn honors_custom_delimiter() {
        let data = "delito;categoria_delito;latitud;longitud;fecha_hechos;colonia_hechos\n\
                    ROBO;ROBO;19.41;-99.16;2019-12-10;ROMA NORTE\n";
        let mut source = IncidentSource::new("unused.csv");
        source.delimiter = Some(";".to_string());
        let catalog = load(data, &source).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn loads_from_file_and_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.csv");
        std::fs::write(
            &path,
            csv(&["2019,Diciembre,2019-12-03,ROBO,ROBO,ROMA NORTE,-99.16,19.41"]),
        )
        .unwrap();

        let catalog =
            IncidentCatalog::load(&IncidentSource::new(&path), ReportingPeriod::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.period(), ReportingPeriod::default());

        let missing = IncidentSource::new(dir.path().join("nope.csv"));
        let err = IncidentCatalog::load(&missing, ReportingPeriod::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn from_records_applies_load_filters() {
        let record = |date: &str, neighborhood: &str| IncidentRecord {
            category: "ROBO".to_string(),
            coarse_category: "ROBO".to_string(),
            coordinate: crime_bot_crime_models::Coordinate::new(19.41, -99.16),
            date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            reported_neighborhood: neighborhood.to_string(),
        };

        let catalog = IncidentCatalog::from_records(
            vec![
                record("2019-12-01", "ROMA NORTE"),
                record("2020-01-01", "ROMA NORTE"),
                record("2019-12-31", " "),
            ],
            ReportingPeriod::default(),
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.stats().outside_period, 1);
        assert_eq!(catalog.stats().missing_neighborhood, 1);
    }
}
