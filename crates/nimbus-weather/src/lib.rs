//! Weather forecasts for Nimbus
//!
//! Fetches OpenWeatherMap One Call forecasts, keeps the latest one per city
//! in a local SQLite cache, and derives display models aligned to the
//! location's own clock.

pub mod cache;
pub mod cities;
pub mod client;
pub mod condition;
pub mod controller;
pub mod dto;
pub mod error;
pub mod info;
pub mod mask;
pub mod records;
pub mod repository;
pub mod retry;
pub mod summary;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use cache::WeatherCache;
pub use client::{OneCallQuery, OpenWeatherClient, WeatherApi};
pub use condition::{align_icon, glyph, Backdrop, Hsl};
pub use controller::{WeatherController, WeatherState};
pub use error::{FailureKind, ForecastError};
pub use info::{
    format_day_name, format_hour, format_min_max, format_temperature, ComfortInfo, CurrentInfo,
    DailyInfo, HourlyIcon, HourlyInfo, MoonPhase, SunInfo, WeatherInfo, WindInfo,
};
pub use mask::{MaskedKey, SlotLayout};
pub use records::{City, ForecastBundle, ResponseRecord, GPS_CITY_ID, GPS_CITY_NAME, NO_CITY_ID};
pub use repository::{FetchEvent, FetchPolicy, FetchTarget, WeatherRepository, WeatherRequest};
pub use summary::summarize;
pub use timeline::{TimeState, UpdateAge};
