//! Forecast-specific error types.

use nimbus_core::error::ReqwestErrorExt;
use nimbus_core::{AppError, ConfigError, WeatherError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("City not found: {0}")]
    CityNotFound(i32),

    #[error("No records found")]
    NoRecordsFound,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Settings error: {0}")]
    Settings(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Coarse classification used when showing a failed refresh next to
/// cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with an error.
    Http,
    /// The server could not be reached.
    Unreachable,
    Unknown,
}

impl ForecastError {
    /// User-friendly error message for terminal display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidApiKey => "Weather API key is invalid. Check config.toml.".to_string(),
            Self::MissingApiKey => {
                "No weather API key configured. Set OPENWEATHER_API_KEY.".to_string()
            }
            Self::LocationNotFound(_) => "Location not found".to_string(),
            Self::CityNotFound(id) => format!("No city with id {id}"),
            Self::NoRecordsFound => "No records found".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {secs} seconds."),
            Self::Api(_) | Self::Parse(_) => "Oops, something went wrong!".to_string(),
            Self::Cache(_) => "Local cache error".to_string(),
            Self::Settings(e) => e.to_string(),
            Self::Network(_) => "Couldn't reach server, check your internet connection.".to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidApiKey
            | Self::LocationNotFound(_)
            | Self::RateLimited(_)
            | Self::Api(_)
            | Self::Parse(_) => FailureKind::Http,
            Self::Network(e) if e.status().is_some() => FailureKind::Http,
            Self::Network(_) => FailureKind::Unreachable,
            Self::MissingApiKey
            | Self::CityNotFound(_)
            | Self::NoRecordsFound
            | Self::Cache(_)
            | Self::Settings(_) => FailureKind::Unknown,
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::Network(e) => AppError::Network(e.into_network_error()),
            ForecastError::InvalidApiKey => AppError::Weather(WeatherError::InvalidApiKey),
            ForecastError::MissingApiKey => {
                AppError::Config(ConfigError::MissingSetting("api.api_key".to_string()))
            }
            ForecastError::LocationNotFound(s) => {
                AppError::Weather(WeatherError::LocationNotFound(s))
            }
            ForecastError::CityNotFound(id) => AppError::Weather(WeatherError::CityNotFound(id)),
            ForecastError::NoRecordsFound => AppError::Weather(WeatherError::NoRecordsFound),
            ForecastError::RateLimited(secs) => AppError::Weather(WeatherError::RateLimited(secs)),
            ForecastError::Api(s) | ForecastError::Parse(s) => {
                AppError::Weather(WeatherError::ApiError(s))
            }
            ForecastError::Cache(s) => AppError::Weather(WeatherError::CacheError(s)),
            ForecastError::Settings(e) => AppError::Config(e),
        }
    }
}
