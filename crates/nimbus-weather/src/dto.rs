//! Wire types of the OpenWeatherMap One Call endpoint and their conversion
//! into cache records.

use serde::{Deserialize, Serialize};

use crate::mask::{MaskedKey, SlotLayout};
use crate::records::{
    ConditionRecord, CurrentBundle, CurrentRecord, DailyBundle, DailyRecord, FeelsLikeRecord,
    ForecastBundle, HourlyBundle, HourlyRecord, ResponseRecord, TempRecord,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneCallResponse {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i32>,
    pub current: Option<CurrentDto>,
    #[serde(default)]
    pub hourly: Vec<HourlyDto>,
    #[serde(default)]
    pub daily: Vec<DailyDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentDto {
    pub dt: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
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
    pub rain: Option<PrecipitationDto>,
    pub snow: Option<PrecipitationDto>,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyDto {
    pub dt: Option<i64>,
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
    pub rain: Option<PrecipitationDto>,
    pub snow: Option<PrecipitationDto>,
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyDto {
    pub dt: Option<i64>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub moonrise: Option<i64>,
    pub moonset: Option<i64>,
    pub moon_phase: Option<f64>,
    pub temp: Option<TempDto>,
    pub feels_like: Option<FeelsLikeDto>,
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
    #[serde(default)]
    pub weather: Vec<ConditionDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TempDto {
    pub morn: Option<f64>,
    pub day: Option<f64>,
    pub eve: Option<f64>,
    pub night: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeelsLikeDto {
    pub morn: Option<f64>,
    pub day: Option<f64>,
    pub eve: Option<f64>,
    pub night: Option<f64>,
}

/// Rain or snow volume for the last hour(s), in mm.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrecipitationDto {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

fn hourly_volume(precipitation: Option<PrecipitationDto>) -> Option<f64> {
    precipitation.and_then(|p| p.one_hour)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default = "default_main")]
    pub main: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

fn default_main() -> String {
    "None".to_string()
}

fn default_description() -> String {
    "no description".to_string()
}

fn default_icon() -> String {
    "01d".to_string()
}

fn secs_to_ms(secs: Option<i64>) -> Option<i64> {
    secs.map(|s| s.saturating_mul(1000))
}

fn conditions(weather: Vec<ConditionDto>, mask: MaskedKey) -> Vec<ConditionRecord> {
    weather
        .into_iter()
        .map(|c| ConditionRecord {
            city_id: mask.city_id(),
            mask,
            condition_id: Some(c.id),
            main: Some(c.main),
            description: Some(c.description),
            icon: Some(c.icon),
        })
        .collect()
}

impl OneCallResponse {
    /// Split the response into cache rows for `city_id`, assigning slots
    /// and masked keys.
    pub fn into_bundle(self, city_id: i32, city_name: &str, fetched_at_ms: i64) -> ForecastBundle {
        let layout = SlotLayout::new(self.daily.len(), self.hourly.len());

        let response = ResponseRecord {
            city_id,
            city_name: city_name.to_string(),
            lat: self.lat,
            lon: self.lon,
            timezone: self.timezone,
            timezone_offset_secs: self.timezone_offset,
            fetched_at_ms,
        };

        let current = Some(match self.current {
            Some(dto) => dto.into_bundle(city_id, layout.current()),
            None => CurrentBundle {
                current: CurrentRecord::empty(city_id),
                conditions: Vec::new(),
            },
        });

        let daily = self
            .daily
            .into_iter()
            .enumerate()
            .map(|(i, dto)| dto.into_bundle(city_id, layout.daily(i)))
            .collect();

        let hourly = self
            .hourly
            .into_iter()
            .enumerate()
            .map(|(i, dto)| dto.into_bundle(city_id, layout.hourly(i)))
            .collect();

        ForecastBundle {
            response,
            current,
            daily,
            hourly,
        }
    }
}

impl CurrentDto {
    fn into_bundle(self, city_id: i32, slot: i32) -> CurrentBundle {
        let mask = MaskedKey::new(city_id, slot);
        CurrentBundle {
            current: CurrentRecord {
                city_id,
                slot,
                dt_ms: secs_to_ms(self.dt),
                sunrise_ms: secs_to_ms(self.sunrise),
                sunset_ms: secs_to_ms(self.sunset),
                temp: self.temp,
                feels_like: self.feels_like,
                pressure: self.pressure,
                humidity: self.humidity,
                dew_point: self.dew_point,
                clouds: self.clouds,
                uvi: self.uvi,
                visibility: self.visibility,
                wind_speed: self.wind_speed,
                wind_gust: self.wind_gust,
                wind_deg: self.wind_deg,
                rain: hourly_volume(self.rain),
                snow: hourly_volume(self.snow),
            },
            conditions: conditions(self.weather, mask),
        }
    }
}

impl HourlyDto {
    fn into_bundle(self, city_id: i32, slot: i32) -> HourlyBundle {
        let mask = MaskedKey::new(city_id, slot);
        HourlyBundle {
            hourly: HourlyRecord {
                city_id,
                slot,
                dt_ms: secs_to_ms(self.dt),
                temp: self.temp,
                feels_like: self.feels_like,
                pressure: self.pressure,
                humidity: self.humidity,
                dew_point: self.dew_point,
                uvi: self.uvi,
                clouds: self.clouds,
                visibility: self.visibility,
                wind_speed: self.wind_speed,
                wind_gust: self.wind_gust,
                wind_deg: self.wind_deg,
                pop: self.pop,
                rain: hourly_volume(self.rain),
                snow: hourly_volume(self.snow),
            },
            conditions: conditions(self.weather, mask),
        }
    }
}

impl DailyDto {
    fn into_bundle(self, city_id: i32, slot: i32) -> DailyBundle {
        let mask = MaskedKey::new(city_id, slot);

        let temp = match self.temp {
            Some(t) => TempRecord {
                city_id,
                mask,
                morn: t.morn,
                day: t.day,
                eve: t.eve,
                night: t.night,
                min: t.min,
                max: t.max,
            },
            None => TempRecord::empty(mask),
        };

        let feels_like = match self.feels_like {
            Some(f) => FeelsLikeRecord {
                city_id,
                mask,
                morn: f.morn,
                day: f.day,
                eve: f.eve,
                night: f.night,
            },
            None => FeelsLikeRecord::empty(mask),
        };

        DailyBundle {
            daily: DailyRecord {
                city_id,
                slot,
                dt_ms: secs_to_ms(self.dt),
                sunrise_ms: secs_to_ms(self.sunrise),
                sunset_ms: secs_to_ms(self.sunset),
                moonrise_ms: secs_to_ms(self.moonrise),
                moonset_ms: secs_to_ms(self.moonset),
                moon_phase: self.moon_phase,
                pressure: self.pressure,
                humidity: self.humidity,
                dew_point: self.dew_point,
                wind_speed: self.wind_speed,
                wind_gust: self.wind_gust,
                wind_deg: self.wind_deg,
                clouds: self.clouds,
                uvi: self.uvi,
                pop: self.pop,
                rain: self.rain,
                snow: self.snow,
            },
            temp,
            feels_like,
            conditions: conditions(self.weather, mask),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn sample() -> OneCallResponse {
        serde_json::from_value(serde_json::json!({
            "lat": 33.44,
            "lon": -94.04,
            "timezone": "America/Chicago",
            "timezone_offset": -21600,
            "current": {
                "dt": 1618317040,
                "sunrise": 1618282134,
                "sunset": 1618333901,
                "temp": 11.07,
                "humidity": 62,
                "wind_speed": 6,
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                "rain": {"1h": 0.21}
            },
            "hourly": [
                {"dt": 1618315200, "temp": 9.58, "weather": [{"id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d"}], "pop": 0, "snow": {"1h": 0.4}},
                {"dt": 1618318800, "temp": 10.1, "weather": []}
            ],
            "daily": [
                {
                    "dt": 1618308000,
                    "sunrise": 1618282134,
                    "sunset": 1618333901,
                    "moon_phase": 0.04,
                    "temp": {"day": 6.79, "min": 2.09, "max": 11.07, "night": 2.09, "eve": 6.21, "morn": 5.49},
                    "feels_like": {"day": 4.59, "night": 3.27, "eve": 3.49, "morn": 3.27},
                    "humidity": 81,
                    "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}],
                    "rain": 0.62
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parses_precipitation_shapes() {
        let response = sample();
        let current = response.current.as_ref().unwrap();
        assert_eq!(current.rain.as_ref().unwrap().one_hour, Some(0.21));
        assert_eq!(response.daily[0].rain, Some(0.62));
    }

    #[test]
    fn test_condition_defaults() {
        let condition: ConditionDto = serde_json::from_str("{}").unwrap();
        assert_eq!(condition.id, 0);
        assert_eq!(condition.main, "None");
        assert_eq!(condition.description, "no description");
        assert_eq!(condition.icon, "01d");
    }

    #[test]
    fn test_bundle_assigns_slots_and_masks() {
        let bundle = sample().into_bundle(4_119_617, "Texarkana", 42);

        assert_eq!(bundle.response.city_id, 4_119_617);
        assert_eq!(bundle.response.timezone_offset_secs, Some(-21600));
        assert_eq!(bundle.response.fetched_at_ms, 42);

        let current = bundle.current.as_ref().unwrap();
        assert_eq!(current.current.slot, 0);
        assert_eq!(current.conditions[0].mask, MaskedKey::new(4_119_617, 0));

        assert_eq!(bundle.daily.len(), 1);
        assert_eq!(bundle.daily[0].daily.slot, 1);
        assert_eq!(bundle.daily[0].temp.mask, MaskedKey::new(4_119_617, 1));
        assert_eq!(bundle.daily[0].feels_like.day, Some(4.59));

        assert_eq!(current.current.rain, Some(0.21));
        assert_eq!(current.current.snow, None);
        assert_eq!(bundle.daily[0].daily.rain, Some(0.62));

        assert_eq!(bundle.hourly.len(), 2);
        assert_eq!(bundle.hourly[0].hourly.slot, 2);
        assert_eq!(bundle.hourly[0].hourly.snow, Some(0.4));
        assert_eq!(bundle.hourly[1].hourly.slot, 3);
        assert!(bundle.hourly[1].conditions.is_empty());
    }

    #[test]
    fn test_seconds_become_millis() {
        let bundle = sample().into_bundle(1, "x", 0);
        assert_eq!(
            bundle.current.unwrap().current.dt_ms,
            Some(1_618_317_040_000)
        );
        assert_eq!(bundle.daily[0].daily.sunrise_ms, Some(1_618_282_134_000));
    }

    #[test]
    fn test_missing_sections() {
        let response: OneCallResponse = serde_json::from_str(r#"{"lat": 1.0, "lon": 2.0}"#).unwrap();
        let bundle = response.into_bundle(0, "gps", 0);

        let current = bundle.current.unwrap();
        assert_eq!(current.current, CurrentRecord::empty(0));
        assert!(current.conditions.is_empty());
        assert!(bundle.daily.is_empty());
        assert!(bundle.hourly.is_empty());
    }

    #[test]
    fn test_missing_temp_gets_empty_record() {
        let response: OneCallResponse =
            serde_json::from_str(r#"{"daily": [{"dt": 100}]}"#).unwrap();
        let bundle = response.into_bundle(9, "x", 0);
        assert_eq!(bundle.daily[0].temp, TempRecord::empty(MaskedKey::new(9, 1)));
    }
}
