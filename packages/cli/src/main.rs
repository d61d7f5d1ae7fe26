#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crime bot.
//!
//! Stands in for the chat transport: takes a coordinate from flags or an
//! interactive prompt, runs the query, prints the report, and optionally
//! saves the chart.
//!
//! Uses `indicatif-log-bridge` (via [`crime_bot_cli_utils::init_logger`])
//! so that log lines and the loading spinner never fight for the terminal.

mod interactive;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crime_bot_cli_utils::{IndicatifProgress, MultiProgress};
use crime_bot_crime_models::Coordinate;
use crime_bot_service::{ConfigError, CrimeService, QueryOutcome, ServiceConfig, ServiceError};

#[derive(Parser)]
#[command(name = "crime_bot", about = "Neighborhood crime reports for a coordinate")]
struct Cli {
    /// Service configuration file (TOML). Defaults to the built-in config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Neighborhood boundaries `GeoJSON`, overriding the config
    #[arg(long, global = true, env = "CRIME_BOT_BOUNDARIES")]
    boundaries: Option<PathBuf>,
    /// Incident CSV export, overriding the config
    #[arg(long, global = true, env = "CRIME_BOT_INCIDENTS")]
    incidents: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report incidents for the neighborhood containing a coordinate
    Lookup {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Write the chart here when one is produced
        #[arg(long)]
        chart_out: Option<PathBuf>,
    },
    /// List loaded neighborhoods in catalog order
    Neighborhoods,
    /// Load both datasets and print load statistics
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = crime_bot_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    log::debug!(
        "Boundaries: {}, incidents: {}, period: {}",
        config.boundaries.path.display(),
        config.incidents.path.display(),
        config.period
    );

    let Some(command) = cli.command else {
        let service = load_service(config, &multi)?;
        return interactive::run(&service);
    };

    match command {
        Commands::Lookup {
            lat,
            lng,
            chart_out,
        } => {
            let coordinate = validate_coordinate(lat, lng)?;
            let service = load_service(config, &multi)?;
            let outcome = service.query(coordinate);
            print_outcome(&outcome);
            if let Some(path) = chart_out {
                save_chart(&outcome, &path)?;
            }
        }
        Commands::Neighborhoods => {
            let service = load_service(config, &multi)?;
            for (i, neighborhood) in service.neighborhoods().all().iter().enumerate() {
                println!("{:>5}  {}", i + 1, neighborhood.name());
            }
        }
        Commands::Check => {
            let service = load_service(config, &multi)?;
            print_check(&service);
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::embedded()?,
    };
    if let Some(path) = &cli.boundaries {
        config = config.with_boundaries_path(path);
    }
    if let Some(path) = &cli.incidents {
        config = config.with_incidents_path(path);
    }
    Ok(config)
}

fn load_service(config: ServiceConfig, multi: &MultiProgress) -> Result<CrimeService, ServiceError> {
    let progress = IndicatifProgress::rows_spinner(multi, "Loading incidents");
    CrimeService::load_with_progress(config, &progress)
}

/// Rejects coordinates outside the valid latitude/longitude ranges.
fn validate_coordinate(lat: f64, lng: f64) -> Result<Coordinate, String> {
    let coordinate = Coordinate::new(lat, lng);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(format!(
            "Invalid coordinate {coordinate}: latitude must be in [-90, 90] and longitude in [-180, 180]"
        ))
    }
}

fn print_outcome(outcome: &QueryOutcome) {
    println!("{}", outcome.text());
}

/// Writes the outcome's chart to `path`, adding the artifact's extension
/// when `path` has none. Does nothing when there is no chart.
fn save_chart(outcome: &QueryOutcome, path: &Path) -> std::io::Result<()> {
    let Some(chart) = outcome.chart() else {
        log::info!("No chart for this query, nothing written");
        return Ok(());
    };

    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension(chart.file_extension());
    }
    std::fs::write(&path, &chart.bytes)?;
    println!("Chart written to {}", path.display());
    Ok(())
}

fn print_check(service: &CrimeService) {
    let boundaries = service.neighborhoods().stats();
    let incidents = service.incidents().stats();

    println!("Neighborhoods");
    println!("  features:       {}", boundaries.features);
    println!("  retained:       {}", boundaries.retained);
    println!("  null geometry:  {}", boundaries.null_geometry);
    println!("  skipped:        {}", boundaries.skipped);
    println!();
    println!("Incidents ({})", service.incidents().period().label());
    println!("  rows:           {}", incidents.rows);
    println!("  retained:       {}", incidents.retained);
    println!("  outside period: {}", incidents.outside_period);
    println!("  no colonia:     {}", incidents.missing_neighborhood);
    println!("  no category:    {}", incidents.missing_category);
    println!("  bad coordinate: {}", incidents.invalid_coordinate);
    println!("  bad date:       {}", incidents.invalid_date);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lookup_with_negative_longitude() {
        let cli = Cli::try_parse_from([
            "crime_bot", "lookup", "--lat", "19.42", "--lng", "-99.16", "--chart-out", "roma",
        ])
        .unwrap();

        let Some(Commands::Lookup {
            lat,
            lng,
            chart_out,
        }) = cli.command
        else {
            panic!("expected lookup");
        };
        assert!((lat - 19.42).abs() < f64::EPSILON);
        assert!((lng - -99.16).abs() < f64::EPSILON);
        assert_eq!(chart_out, Some(PathBuf::from("roma")));
    }

    #[test]
    fn no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["crime_bot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn flags_override_dataset_paths() {
        let cli = Cli::try_parse_from([
            "crime_bot",
            "--boundaries",
            "b.geojson",
            "--incidents",
            "i.csv",
            "check",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.boundaries.path, PathBuf::from("b.geojson"));
        assert_eq!(config.incidents.path, PathBuf::from("i.csv"));
    }

    #[test]
    fn validates_coordinate_ranges() {
        assert!(validate_coordinate(19.42, -99.16).is_ok());
        assert!(validate_coordinate(-90.0, 180.0).is_ok());
        assert!(validate_coordinate(91.0, -99.16).is_err());
        assert!(validate_coordinate(19.42, -181.0).is_err());
        assert!(validate_coordinate(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn save_chart_adds_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        let outcome = QueryOutcome::ReportWithChart {
            neighborhood: "Roma Norte".to_string(),
            text: String::new(),
            chart: crime_bot_service::ImageArtifact {
                media_type: "image/svg+xml",
                bytes: b"<svg/>".to_vec(),
            },
        };
        save_chart(&outcome, &dir.join("roma")).unwrap();
        assert_eq!(std::fs::read(dir.join("roma.svg")).unwrap(), b"<svg/>");

        let not_found = QueryOutcome::NotFound {
            text: String::new(),
        };
        save_chart(&not_found, &dir.join("nothing")).unwrap();
        assert!(!dir.join("nothing.svg").exists());
    }
}
