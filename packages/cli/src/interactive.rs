//! Interactive prompts for running lookups without memorizing flags.

use std::path::PathBuf;

use crime_bot_crime_models::Coordinate;
use crime_bot_service::CrimeService;
use dialoguer::{Confirm, Input, Select};

/// Actions offered by the interactive menu.
enum Action {
    Lookup,
    ListNeighborhoods,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[Self::Lookup, Self::ListNeighborhoods, Self::Quit];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Lookup => "Look up a coordinate",
            Self::ListNeighborhoods => "List neighborhoods",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu loop against an already-loaded service until the user
/// quits.
///
/// # Errors
///
/// Returns an error if a prompt fails or a chart cannot be written.
pub fn run(service: &CrimeService) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Bot ({})", service.incidents().period().label());
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::Lookup => lookup(service)?,
            Action::ListNeighborhoods => {
                for neighborhood in service.neighborhoods().all() {
                    println!("  {}", neighborhood.name());
                }
                println!();
            }
            Action::Quit => return Ok(()),
        }
    }
}

fn lookup(service: &CrimeService) -> Result<(), Box<dyn std::error::Error>> {
    let latitude: f64 = Input::new()
        .with_prompt("Latitude")
        .validate_with(|v: &f64| -> Result<(), &str> {
            if (-90.0..=90.0).contains(v) {
                Ok(())
            } else {
                Err("latitude must be in [-90, 90]")
            }
        })
        .interact_text()?;

    let longitude: f64 = Input::new()
        .with_prompt("Longitude")
        .validate_with(|v: &f64| -> Result<(), &str> {
            if (-180.0..=180.0).contains(v) {
                Ok(())
            } else {
                Err("longitude must be in [-180, 180]")
            }
        })
        .interact_text()?;

    let outcome = service.query(Coordinate::new(latitude, longitude));
    println!();
    println!("{}", outcome.text());

    if outcome.chart().is_some()
        && Confirm::new()
            .with_prompt("Save the chart?")
            .default(false)
            .interact()?
    {
        let path: String = Input::new()
            .with_prompt("Output path")
            .default("chart.svg".to_string())
            .interact_text()?;
        crate::save_chart(&outcome, &PathBuf::from(path))?;
    }

    Ok(())
}
