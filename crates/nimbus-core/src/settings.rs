//! User presentation settings and their persistence.
//!
//! Settings are separate from [`crate::Config`]: config describes how to reach
//! the API and where to store data, settings describe what the user wants to
//! see. They are written back on every change.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// OpenWeatherMap id of New York, the city shown before the user picks one.
pub const DEFAULT_CITY_ID: i32 = 5_128_638;

/// Temperature unit used for display. Data is always fetched in metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    #[default]
    AmPm,
    Hours24,
}

/// How long a cached forecast is trusted before the next refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateInterval {
    #[default]
    Every6Hours,
    Every12Hours,
    Every24Hours,
}

impl UpdateInterval {
    pub fn hours(&self) -> u64 {
        match self {
            Self::Every6Hours => 6,
            Self::Every12Hours => 12,
            Self::Every24Hours => 24,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.hours() * 3600)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Bulgarian,
}

impl Language {
    /// Value of the `lang` query parameter.
    pub fn api_code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Bulgarian => "bg",
        }
    }

    pub fn locale(&self) -> &'static str {
        match self {
            Self::English => "en_US",
            Self::Bulgarian => "bg_BG",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub temperature_unit: TemperatureUnit,
    pub time_format: TimeFormat,
    pub update_interval: UpdateInterval,
    pub use_current_location: bool,
    pub selected_city_id: i32,
    pub language: Language,
    pub show_wind: bool,
    pub show_sunrise_sunset: bool,
    pub show_comfort_level: bool,
    pub show_next_24_hours: bool,
    pub show_next_4_days: bool,
    pub enable_animation: bool,
    pub current_location: Option<Coordinates>,
    /// Epoch millis of the last successful network refresh
    pub last_updated_ms: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::default(),
            time_format: TimeFormat::default(),
            update_interval: UpdateInterval::default(),
            use_current_location: false,
            selected_city_id: DEFAULT_CITY_ID,
            language: Language::default(),
            show_wind: true,
            show_sunrise_sunset: true,
            show_comfort_level: true,
            show_next_24_hours: true,
            show_next_4_days: true,
            enable_animation: true,
            current_location: None,
            last_updated_ms: 0,
        }
    }
}

/// Keys accepted by [`Settings::set_value`], in display order.
pub const SETTING_KEYS: &[&str] = &[
    "temperature_unit",
    "time_format",
    "update_interval",
    "use_current_location",
    "selected_city_id",
    "language",
    "show_wind",
    "show_sunrise_sunset",
    "show_comfort_level",
    "show_next_24_hours",
    "show_next_4_days",
    "enable_animation",
];

impl Settings {
    /// True when the update interval has elapsed since the last refresh.
    pub fn is_refresh_due(&self, now_ms: i64) -> bool {
        let interval_ms = self.update_interval.duration().as_millis() as i64;
        now_ms.saturating_sub(self.last_updated_ms) >= interval_ms
    }

    /// Coordinates to use for a location request, if enabled and known.
    pub fn location_target(&self) -> Option<Coordinates> {
        if self.use_current_location {
            self.current_location.filter(Coordinates::is_valid)
        } else {
            None
        }
    }

    /// Parse `value` and assign it to the setting named `key`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "temperature_unit" => self.temperature_unit = parse_choice(key, value)?,
            "time_format" => self.time_format = parse_choice(key, value)?,
            "update_interval" => self.update_interval = parse_choice(key, value)?,
            "language" => self.language = parse_choice(key, value)?,
            "selected_city_id" => {
                self.selected_city_id = value
                    .parse()
                    .map_err(|_| invalid(key, value))?;
            }
            other => *self.flag_mut(other)? = parse_bool(key, value)?,
        }
        Ok(())
    }

    /// Flip a boolean setting and return its new value.
    pub fn toggle(&mut self, key: &str) -> Result<bool, ConfigError> {
        let flag = self.flag_mut(key)?;
        *flag = !*flag;
        Ok(*flag)
    }

    /// Current value of `key` as the string `set_value` accepts.
    pub fn get_value(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "temperature_unit" => choice_name(&self.temperature_unit),
            "time_format" => choice_name(&self.time_format),
            "update_interval" => choice_name(&self.update_interval),
            "language" => choice_name(&self.language),
            "selected_city_id" => self.selected_city_id.to_string(),
            "use_current_location" => self.use_current_location.to_string(),
            "show_wind" => self.show_wind.to_string(),
            "show_sunrise_sunset" => self.show_sunrise_sunset.to_string(),
            "show_comfort_level" => self.show_comfort_level.to_string(),
            "show_next_24_hours" => self.show_next_24_hours.to_string(),
            "show_next_4_days" => self.show_next_4_days.to_string(),
            "enable_animation" => self.enable_animation.to_string(),
            other => return Err(ConfigError::UnknownSetting(other.to_string())),
        };
        Ok(value)
    }

    fn flag_mut(&mut self, key: &str) -> Result<&mut bool, ConfigError> {
        match key {
            "use_current_location" => Ok(&mut self.use_current_location),
            "show_wind" => Ok(&mut self.show_wind),
            "show_sunrise_sunset" => Ok(&mut self.show_sunrise_sunset),
            "show_comfort_level" => Ok(&mut self.show_comfort_level),
            "show_next_24_hours" => Ok(&mut self.show_next_24_hours),
            "show_next_4_days" => Ok(&mut self.show_next_4_days),
            "enable_animation" => Ok(&mut self.enable_animation),
            other => Err(ConfigError::UnknownSetting(other.to_string())),
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid(format!("{key}: unsupported value '{value}'"))
}

// Enum settings go through serde so the CLI accepts exactly the names
// written to settings.toml.
fn parse_choice<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T, ConfigError> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| invalid(key, value))
}

fn choice_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

/// Persistence for [`Settings`].
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, ConfigError>;
    fn save(&self, settings: &Settings) -> Result<(), ConfigError>;

    /// Load, apply `change`, save, and return the stored value.
    fn update(&self, change: &mut dyn FnMut(&mut Settings)) -> Result<Settings, ConfigError> {
        let mut settings = self.load()?;
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Settings stored as TOML on disk. A missing file reads as defaults.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::NotFound(format!("{}: {e}", self.path.display())))?;
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Invalid(format!("{}: {e}", parent.display())))?;
        }
        let contents =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", self.path.display())))?;
        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

/// In-process settings, used by tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        *self.inner.lock() = settings.clone();
        Ok(())
    }
}
