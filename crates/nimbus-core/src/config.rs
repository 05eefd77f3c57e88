use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding config.toml, settings.toml and the cache database
    pub config_dir: PathBuf,

    /// Remote weather API
    #[serde(default)]
    pub api: ApiConfig,

    /// Local SQLite cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Request sequencing
    #[serde(default)]
    pub requests: RequestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the OpenWeatherMap API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OpenWeatherMap application id (can be set via OPENWEATHER_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (timeouts, 5xx, 429)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// SQLite file name, relative to `config_dir` unless absolute
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_database_file() -> String {
    "weather.db".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Delay before a queued request hits the network
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1500
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nimbus")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            api: ApiConfig::default(),
            cache: CacheConfig::default(),
            requests: RequestConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating it if missing.
    ///
    /// `OPENWEATHER_API_KEY` overrides the stored key in memory only.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_key_override(path, std::env::var(API_KEY_ENV).ok())
    }

    fn load_with_key_override(path: &Path, env_key: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents).context("Failed to parse config file")?
        } else {
            let mut config = Self::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            config
        };

        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            config.api.api_key = Some(key);
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.api.base_url, "api.base_url", &mut result);

        match self.api.api_key.as_deref().map(str::trim) {
            None | Some("") => result.add_warning(
                "api.api_key",
                format!("No API key configured; set {API_KEY_ENV} or only cached data is shown"),
            ),
            Some(_) => {}
        }

        if self.api.timeout_secs == 0 {
            result.add_error("api.timeout_secs", "Timeout must be greater than 0");
        } else if self.api.timeout_secs > 120 {
            result.add_warning("api.timeout_secs", "Timeout is unusually large (>120s)");
        }

        if self.api.max_retries > 10 {
            result.add_warning("api.max_retries", "More than 10 retries per request");
        }

        if self.cache.database_file.trim().is_empty() {
            result.add_error("cache.database_file", "Database file name must not be empty");
        }

        if self.requests.debounce_ms > 60_000 {
            result.add_warning(
                "requests.debounce_ms",
                "Requests wait more than a minute before starting",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Full path of the SQLite cache.
    pub fn database_path(&self) -> PathBuf {
        let file = Path::new(&self.cache.database_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.config_dir.join(file)
        }
    }

    /// Full path of the user settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn config_with_key() -> Config {
        let mut config = Config::default();
        config.api.api_key = Some("abc123".to_string());
        config
    }

    #[test]
    fn test_valid_default_config() {
        let result = config_with_key().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = config_with_key();
        config.api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = config_with_key();
        config.api.base_url = "ftp://api.openweathermap.org".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_missing_api_key_is_warning() {
        let mut config = Config::default();
        config.api.api_key = None;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "api.api_key"));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = config_with_key();
        config.api.timeout_secs = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "api.timeout_secs"));
    }

    #[test]
    fn test_database_path_relative_and_absolute() {
        let mut config = Config::default();
        config.config_dir = PathBuf::from("/tmp/nimbus-test");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/nimbus-test/weather.db")
        );

        config.cache.database_file = "/var/cache/w.db".to_string();
        assert_eq!(config.database_path(), PathBuf::from("/var/cache/w.db"));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_dir, dir.path());
        assert_eq!(config.requests.debounce_ms, 1500);
    }

    #[test]
    fn test_env_key_is_not_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config =
            Config::load_with_key_override(&path, Some("env-secret".to_string())).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("env-secret"));

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("env-secret"));
        let reloaded = Config::load_with_key_override(&path, None).unwrap();
        assert!(reloaded.api.api_key.is_none());
    }

    #[test]
    fn test_env_key_overrides_file_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_dir = \"/tmp/x\"\n[api]\napi_key = \"file-key\"\n").unwrap();

        let config = Config::load_with_key_override(&path, Some("env-key".to_string())).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("env-key"));

        let config = Config::load_with_key_override(&path, Some("  ".to_string())).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/x\"\n[api]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.api.base_url, "https://api.openweathermap.org");
        assert_eq!(config.cache.database_file, "weather.db");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
