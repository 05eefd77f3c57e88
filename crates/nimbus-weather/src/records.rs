//! Normalized rows stored in the local cache.
//!
//! Times are UTC epoch milliseconds. Every numeric field is optional because
//! the API omits values it does not have (no `rain` on a dry day, no
//! `visibility` for some stations).

use serde::{Deserialize, Serialize};

use crate::mask::{MaskedKey, CURRENT_SLOT};

/// City id used for forecasts requested by coordinates.
pub const GPS_CITY_ID: i32 = 0;
/// City name used for forecasts requested by coordinates.
pub const GPS_CITY_NAME: &str = "gps";
/// Sentinel for "no city selected".
pub const NO_CITY_ID: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i32,
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    /// "Sofia, BG" or "Springfield, IL, US".
    pub fn display_name(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None if self.country.is_empty() => self.name.clone(),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// One row per cached city: where and when the forecast came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub city_id: i32,
    pub city_name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset_secs: Option<i32>,
    pub fetched_at_ms: i64,
}

impl ResponseRecord {
    pub fn offset_ms(&self) -> i64 {
        self.timezone_offset_secs.map_or(0, |s| i64::from(s) * 1000)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentRecord {
    pub city_id: i32,
    pub slot: i32,
    pub dt_ms: Option<i64>,
    pub sunrise_ms: Option<i64>,
    pub sunset_ms: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub clouds: Option<f64>,
    pub uvi: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_deg: Option<f64>,
    /// Precipitation of the last hour, mm.
    pub rain: Option<f64>,
    pub snow: Option<f64>,
}

impl CurrentRecord {
    /// A record carrying only its keys.
    pub fn empty(city_id: i32) -> Self {
        Self {
            city_id,
            slot: CURRENT_SLOT,
            ..Self::default()
        }
    }

    pub fn mask(&self) -> MaskedKey {
        MaskedKey::new(self.city_id, self.slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub city_id: i32,
    pub slot: i32,
    pub dt_ms: Option<i64>,
    pub sunrise_ms: Option<i64>,
    pub sunset_ms: Option<i64>,
    pub moonrise_ms: Option<i64>,
    pub moonset_ms: Option<i64>,
    pub moon_phase: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_deg: Option<f64>,
    pub clouds: Option<f64>,
    pub uvi: Option<f64>,
    pub pop: Option<f64>,
    pub rain: Option<f64>,
    pub snow: Option<f64>,
}

impl DailyRecord {
    pub fn mask(&self) -> MaskedKey {
        MaskedKey::new(self.city_id, self.slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    pub city_id: i32,
    pub slot: i32,
    pub dt_ms: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub dew_point: Option<f64>,
    pub uvi: Option<f64>,
    pub clouds: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_deg: Option<f64>,
    pub pop: Option<f64>,
    /// Precipitation of the hour, mm.
    pub rain: Option<f64>,
    pub snow: Option<f64>,
}

impl HourlyRecord {
    pub fn mask(&self) -> MaskedKey {
        MaskedKey::new(self.city_id, self.slot)
    }
}

/// Daily temperature spread, linked to a daily row by `mask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempRecord {
    pub city_id: i32,
    pub mask: MaskedKey,
    pub morn: Option<f64>,
    pub day: Option<f64>,
    pub eve: Option<f64>,
    pub night: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TempRecord {
    pub fn empty(mask: MaskedKey) -> Self {
        Self {
            city_id: mask.city_id(),
            mask,
            morn: None,
            day: None,
            eve: None,
            night: None,
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeelsLikeRecord {
    pub city_id: i32,
    pub mask: MaskedKey,
    pub morn: Option<f64>,
    pub day: Option<f64>,
    pub eve: Option<f64>,
    pub night: Option<f64>,
}

impl FeelsLikeRecord {
    pub fn empty(mask: MaskedKey) -> Self {
        Self {
            city_id: mask.city_id(),
            mask,
            morn: None,
            day: None,
            eve: None,
            night: None,
        }
    }
}

/// A weather condition ("Rain", "light rain", icon "10d") of one forecast row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub city_id: i32,
    pub mask: MaskedKey,
    pub condition_id: Option<i32>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBundle {
    pub current: CurrentRecord,
    pub conditions: Vec<ConditionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBundle {
    pub daily: DailyRecord,
    pub temp: TempRecord,
    pub feels_like: FeelsLikeRecord,
    pub conditions: Vec<ConditionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyBundle {
    pub hourly: HourlyRecord,
    pub conditions: Vec<ConditionRecord>,
}

/// Everything cached for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBundle {
    pub response: ResponseRecord,
    pub current: Option<CurrentBundle>,
    pub daily: Vec<DailyBundle>,
    pub hourly: Vec<HourlyBundle>,
}

impl ForecastBundle {
    pub fn city_id(&self) -> i32 {
        self.response.city_id
    }

    pub fn offset_ms(&self) -> i64 {
        self.response.offset_ms()
    }
}
