//! Nimbus core
//!
//! Configuration, user settings, error types and logging shared by the
//! weather crate and the CLI.

pub mod app;
pub mod config;
pub mod error;
pub mod settings;

pub use app::App;
pub use config::{ApiConfig, CacheConfig, Config, RequestConfig, ValidationResult};
pub use error::{AppError, ConfigError, DatabaseError, NetworkError, WeatherError};
pub use settings::{
    Coordinates, FileSettingsStore, Language, MemorySettingsStore, Settings, SettingsStore,
    TemperatureUnit, TimeFormat, UpdateInterval,
};

use anyhow::Result;

/// Initialize logging. `RUST_LOG` wins over `default_level`.
pub fn init_with_level(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::debug!("Nimbus core initialized");
    Ok(())
}
