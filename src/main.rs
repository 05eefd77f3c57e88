//! Nimbus CLI
//!
//! Weather forecasts in the terminal, served from a local cache when the
//! network is unavailable.

#![allow(clippy::print_stdout)]

mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use nimbus_core::settings::SETTING_KEYS;
use nimbus_core::{App, AppError, Config, ConfigError};
use nimbus_weather::timeline::now_ms;
use nimbus_weather::{
    FetchPolicy, ForecastError, OpenWeatherClient, UpdateAge, WeatherCache, WeatherController,
    WeatherRepository, WeatherRequest,
};

use render::{render, Freshness};

type Result<T> = std::result::Result<T, AppError>;

/// Nimbus weather
#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about = "Weather forecasts with an offline cache", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: the platform config directory)
    #[arg(short, long, env = "NIMBUS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the forecast for the saved selection or a given place
    Show {
        /// City id from the city list
        #[arg(long, conflicts_with_all = ["city", "lat"])]
        city_id: Option<i32>,

        /// City name (first prefix match)
        #[arg(long, conflicts_with = "lat")]
        city: Option<String>,

        /// Latitude, together with --lon
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, together with --lat
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Always fetch from the API
        #[arg(long, conflicts_with = "cached")]
        refresh: bool,

        /// Use the cached forecast when there is one
        #[arg(long)]
        cached: bool,

        /// Print the display model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search and import cities
    Cities {
        #[command(subcommand)]
        command: CityCommands,
    },

    /// Inspect or clear the forecast cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Read and change presentation settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Validate the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CityCommands {
    /// Cities whose name starts with PREFIX
    Search { prefix: String },
    /// Import an OpenWeatherMap city list (JSON array)
    Import { file: PathBuf },
    /// Show one city
    Show { id: i32 },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached forecasts
    List,
    /// Remove every cached forecast
    Clear,
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print all settings
    Show,
    /// Set KEY to VALUE
    Set { key: String, value: String },
    /// Flip a boolean setting
    Toggle { key: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Report configuration errors and warnings
    Check,
}

/// Log filter from the verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn load_app(config: Option<&PathBuf>) -> Result<App> {
    let app = match config {
        Some(path) => App::from_path(path),
        None => App::new(),
    }
    .map_err(|e| ConfigError::Invalid(format!("{e:#}")))?;
    app.initialize()?;
    Ok(app)
}

fn open_repository(app: &App) -> Result<WeatherRepository<OpenWeatherClient>> {
    let config = app.config();
    let client = OpenWeatherClient::new(&config.api)?;
    let cache = WeatherCache::open(config.database_path())?;
    Ok(WeatherRepository::new(client, cache))
}

/// Print a failed command: the short message, then the details.
fn report(err: &AppError) {
    tracing::debug!(error = ?err, "Command failed");
    match err {
        AppError::Other(e) => eprintln!("error: {e:#}"),
        _ => {
            eprintln!("error: {}", err.user_message());
            eprintln!("  {err}");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = nimbus_core::init_with_level(log_filter_from_verbosity(cli.verbose)) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config {
        command: ConfigCommands::Check,
    } = &cli.command
    {
        return check_config(cli.config.as_ref());
    }

    let app = load_app(cli.config.as_ref())?;
    tracing::debug!("Nimbus started");

    match cli.command {
        Commands::Show {
            city_id,
            city,
            lat,
            lon,
            refresh,
            cached,
            json,
        } => {
            let policy = match (refresh, cached) {
                (true, _) => Some(FetchPolicy::Refresh),
                (_, true) => Some(FetchPolicy::PreferCache),
                _ => None,
            };
            let target = match (city_id, city, lat.zip(lon)) {
                (Some(id), _, _) => Target::CityId(id),
                (_, Some(name), _) => Target::CityName(name),
                (_, _, Some((lat, lon))) => Target::Coordinates(lat, lon),
                _ => Target::Selected,
            };
            show(&app, target, policy, json).await?;
        }

        Commands::Cities { command } => {
            let repository = open_repository(&app)?;
            match command {
                CityCommands::Search { prefix } => {
                    for city in repository.search_cities(&prefix)? {
                        println!("{:>9}  {}", city.id, city.display_name());
                    }
                }
                CityCommands::Import { file } => {
                    let count = repository.import_cities(&file)?;
                    println!("Imported {count} cities from {}", file.display());
                }
                CityCommands::Show { id } => match repository.city_by_id(id)? {
                    Some(city) => {
                        println!("{}", city.display_name());
                        println!("  id:  {}", city.id);
                        println!("  lat: {}", city.lat);
                        println!("  lon: {}", city.lon);
                    }
                    None => println!("No city selected"),
                },
            }
        }

        Commands::Cache { command } => {
            let repository = open_repository(&app)?;
            match command {
                CacheCommands::List => {
                    let now = now_ms();
                    let forecasts = repository.cached_forecasts()?;
                    if forecasts.is_empty() {
                        println!("Cache is empty");
                    }
                    for record in forecasts {
                        println!(
                            "{:>9}  {:<24}  {}",
                            record.city_id,
                            record.city_name,
                            UpdateAge::since(record.fetched_at_ms, now)
                        );
                    }
                }
                CacheCommands::Clear => {
                    repository.clear_cache()?;
                    println!("Cache cleared");
                }
            }
        }

        Commands::Settings { command } => {
            let store = app.settings();
            match command {
                SettingsCommands::Show => {
                    let settings = store.load()?;
                    for key in SETTING_KEYS {
                        println!("{key} = {}", settings.get_value(key)?);
                    }
                }
                SettingsCommands::Set { key, value } => {
                    let mut settings = store.load()?;
                    settings.set_value(&key, &value)?;
                    store.save(&settings)?;
                    println!("{key} = {}", settings.get_value(&key)?);
                }
                SettingsCommands::Toggle { key } => {
                    let mut settings = store.load()?;
                    let value = settings.toggle(&key)?;
                    store.save(&settings)?;
                    println!("{key} = {value}");
                }
            }
        }

        Commands::Config { .. } => {}
    }

    app.shutdown();
    Ok(())
}

enum Target {
    Selected,
    CityId(i32),
    CityName(String),
    Coordinates(f64, f64),
}

async fn show(app: &App, target: Target, policy: Option<FetchPolicy>, json: bool) -> Result<()> {
    let settings_store = app.settings();
    let settings = settings_store.load()?;
    let controller = WeatherController::new(
        Arc::new(open_repository(app)?),
        settings_store.clone(),
        Duration::from_millis(app.config().requests.debounce_ms),
    );
    let repository = controller.repository();
    let now = now_ms();

    let (request, default_policy) = match target {
        Target::Selected => controller.selected_request(now)?,
        Target::CityId(id) => {
            let city = repository
                .city_by_id(id)?
                .ok_or(ForecastError::CityNotFound(id))?;
            (
                WeatherRequest::for_city(city, settings.language),
                FetchPolicy::PreferCache,
            )
        }
        Target::CityName(name) => {
            let city = repository
                .search_cities(&name)?
                .into_iter()
                .next()
                .ok_or(ForecastError::NoRecordsFound)?;
            (
                WeatherRequest::for_city(city, settings.language),
                FetchPolicy::PreferCache,
            )
        }
        Target::Coordinates(lat, lon) => (
            WeatherRequest::for_coordinates(lat, lon, settings.language),
            FetchPolicy::PreferCache,
        ),
    };

    controller
        .request(request, policy.unwrap_or(default_policy), Duration::ZERO)
        .await
        .context("Weather request task failed")?;

    let state = controller.state();
    let Some(info) = state.info else {
        let message = state
            .error
            .unwrap_or_else(|| "No forecast available".to_string());
        return Err(anyhow::anyhow!(message).into());
    };

    if json {
        let output = serde_json::json!({
            "cached": state.cached,
            "error": state.error,
            "info": info,
        });
        let json = serde_json::to_string_pretty(&output).context("Failed to encode forecast")?;
        println!("{json}");
        return Ok(());
    }

    let settings = settings_store.load()?;
    let freshness = Freshness {
        cached: state.cached,
        error: state.error,
        now_ms: now_ms(),
    };
    println!("{}", render(&info, &settings, &freshness));
    Ok(())
}

fn check_config(path: Option<&PathBuf>) -> Result<()> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| ConfigError::ParseError(format!("{e:#}")))?;
    let validation = config.validate();

    println!("Config directory: {}", config.config_dir.display());
    println!("Database:         {}", config.database_path().display());
    println!("Settings:         {}", config.settings_path().display());

    for warning in &validation.warnings {
        println!("warning: {warning}");
    }
    for error in &validation.errors {
        println!("error: {error}");
    }

    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()).into());
    }
    println!("Configuration OK");
    Ok(())
}
