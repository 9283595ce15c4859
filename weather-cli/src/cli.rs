use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_core::{
    Config, Coordinate, FileStore, IconCache, LocationProvider, WeatherOrchestrator,
    provider_from_config,
};

use crate::{location::FixedLocation, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather for a city; without one, for the last city.
    Show {
        city: Option<String>,

        /// Also fetch the condition icon.
        #[arg(long)]
        icon: bool,
    },

    /// Show current weather for a position, falling back to the last city.
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Also fetch the condition icon.
        #[arg(long)]
        icon: bool,
    },
}

pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, icon } => {
                let orchestrator = build(None)?;
                match city {
                    Some(city) => orchestrator.fetch_city(&city).await,
                    None => orchestrator.load_last_city().await,
                }
                print_state(&orchestrator, icon).await;
                Ok(())
            }
            Command::Here { lat, lon, icon } => {
                let coordinate = match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
                    _ => None,
                };
                let orchestrator = build(coordinate)?;
                orchestrator.start_with_location().await;
                print_state(&orchestrator, icon).await;
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_api_key(api_key);
    anyhow::ensure!(config.is_configured(), "The API key must not be empty");
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build(coordinate: Option<Coordinate>) -> anyhow::Result<WeatherOrchestrator> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let location = LocationProvider::new(Arc::new(FixedLocation::new(coordinate)));
    let icons = IconCache::from_config(&config);
    let store = FileStore::open_default()?;

    Ok(WeatherOrchestrator::new(Arc::from(provider), location, icons, Arc::new(store)))
}

async fn print_state(orchestrator: &WeatherOrchestrator, with_icon: bool) {
    let state = orchestrator.state();

    let icon = match state.reading.as_ref().and_then(|r| r.icon_code()) {
        Some(code) if with_icon => orchestrator.resolve_icon(code).await,
        _ => None,
    };

    print!("{}", render::state(&state, icon.as_ref()));
}
