//! Centralized error types for Nimbus.
//!
//! Every crate in the workspace converts its own errors into [`AppError`]
//! at the edge, so the CLI can show a short `user_message()` while the
//! full error chain goes to the log.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for the terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a short, non-technical message.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "Could not reach the server.",
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather server is having issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "Oops, something went wrong.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Local storage errors (SQLite cache).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => "Unable to open the local weather cache.",
            DatabaseError::QueryFailed(_) => "A cache operation failed. Please try again.",
            DatabaseError::Corruption(_) => {
                "The local cache may be corrupted. Try `nimbus cache clear`."
            }
        }
    }
}

/// Configuration and settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration not found. Using defaults.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
            ConfigError::UnknownSetting(_) => "No such setting. Run `nimbus settings show`.",
        }
    }
}

/// Weather service errors as seen by the application.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("City not found: {0}")]
    CityNotFound(i32),

    #[error("No records found")]
    NoRecordsFound,

    #[error("Weather API error: {0}")]
    ApiError(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Location not found. Check and try again.",
            WeatherError::CityNotFound(_) => "City not found. Try `nimbus cities search`.",
            WeatherError::NoRecordsFound => "No records found.",
            WeatherError::ApiError(_) => "Oops, something went wrong.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check config.toml.",
            WeatherError::RateLimited(_) => "Too many requests. Please wait and try again.",
            WeatherError::ServiceUnavailable => "Could not reach the server.",
            WeatherError::CacheError(_) => "Weather data may be outdated.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors = vec![
            AppError::from(NetworkError::Timeout),
            AppError::from(DatabaseError::QueryFailed("test".into())),
            AppError::from(ConfigError::Invalid("test".into())),
            AppError::from(WeatherError::ServiceUnavailable),
            AppError::from(WeatherError::NoRecordsFound),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err}");
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let weather_err = WeatherError::InvalidApiKey;
        let app_err: AppError = weather_err.into();
        assert!(matches!(app_err, AppError::Weather(WeatherError::InvalidApiKey)));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Weather(WeatherError::ServiceUnavailable);
        assert_eq!(app_err.user_message(), "Could not reach the server.");
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let server = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert!(server.user_message().contains("later"));
        assert_eq!(client.user_message(), "Oops, something went wrong.");
    }

    #[test]
    fn test_rusqlite_error_maps_to_query_failed() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
