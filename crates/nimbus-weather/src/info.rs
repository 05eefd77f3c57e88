//! Display models derived from a cached forecast.
//!
//! Values stay metric and in epoch milliseconds (already shifted to the
//! location's clock). The `format_*` helpers turn them into display strings
//! according to the user's unit and time format settings.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use nimbus_core::{TemperatureUnit, TimeFormat};

use crate::condition::Backdrop;
use crate::timeline::TimeState;

pub const NEXT_DAYS: usize = 4;
pub const NEXT_HOURS: usize = 24;

const NOT_AVAILABLE: &str = "N/A";
const MS_TO_MPH: f64 = 2.237;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    pub city_name: String,
    /// When the forecast was fetched from the API (UTC ms).
    pub fetched_at_ms: i64,
    pub backdrop: Backdrop,
    pub current: CurrentInfo,
    pub next_days: Vec<DailyInfo>,
    pub next_hours: Vec<HourlyInfo>,
    pub comfort: ComfortInfo,
    pub wind: WindInfo,
    pub sun: SunInfo,
}

impl Default for WeatherInfo {
    fn default() -> Self {
        Self {
            city_name: String::new(),
            fetched_at_ms: 0,
            backdrop: Backdrop::default(),
            current: CurrentInfo::default(),
            next_days: vec![DailyInfo::default(); NEXT_DAYS],
            next_hours: vec![HourlyInfo::default(); NEXT_HOURS],
            comfort: ComfortInfo::default(),
            wind: WindInfo::default(),
            sun: SunInfo::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentInfo {
    pub temperature: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub time_state: TimeState,
}

impl Default for CurrentInfo {
    fn default() -> Self {
        Self {
            temperature: None,
            min: None,
            max: None,
            title: "None".to_string(),
            subtitle: "no description".to_string(),
            icon: "01d".to_string(),
            time_state: TimeState::Day,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyInfo {
    pub time_ms: Option<i64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub icon: Option<String>,
}

impl DailyInfo {
    pub fn day_name(&self) -> String {
        format_day_name(self.time_ms, false)
    }

    pub fn short_day_name(&self) -> String {
        format_day_name(self.time_ms, true)
    }
}

/// What to draw next to an hourly entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourlyIcon {
    #[default]
    None,
    Sunrise,
    Sunset,
    Condition(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyInfo {
    pub time_ms: Option<i64>,
    pub temperature: Option<f64>,
    pub icon: HourlyIcon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComfortInfo {
    pub humidity: Option<f64>,
    pub feels_like: Option<f64>,
    pub uvi: Option<f64>,
}

impl ComfortInfo {
    pub fn feels_like_text(&self, unit: TemperatureUnit) -> String {
        match (self.feels_like, unit) {
            (None, _) => NOT_AVAILABLE.to_string(),
            (Some(c), TemperatureUnit::Celsius) => format!("{c} °C"),
            (Some(c), TemperatureUnit::Fahrenheit) => format!("{} °F", to_fahrenheit(c)),
        }
    }

    pub fn uvi_text(&self) -> String {
        self.uvi
            .map_or_else(|| NOT_AVAILABLE.to_string(), |uv| format!("{uv} uv"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindInfo {
    pub deg: Option<f64>,
    pub speed: Option<f64>,
}

impl WindInfo {
    pub fn deg_text(&self) -> String {
        self.deg
            .map_or_else(|| NOT_AVAILABLE.to_string(), |deg| format!("{deg} °"))
    }

    /// Metres per second for Celsius users, miles per hour otherwise.
    pub fn speed_text(&self, unit: TemperatureUnit) -> String {
        match (self.speed, unit) {
            (None, _) => NOT_AVAILABLE.to_string(),
            (Some(speed), TemperatureUnit::Celsius) => format!("{speed} m/s"),
            (Some(speed), TemperatureUnit::Fahrenheit) => {
                format!("{} mph", (speed * MS_TO_MPH).round() as i64)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    const ORDER: [MoonPhase; 7] = [
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    /// Phase for the API's moon fraction, where 0 and 1 are new moon and
    /// 0.5 is full moon. Each phase covers an eighth centred on its value.
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        let eighth = 1.0 / 8.0;
        let start = eighth / 2.0;

        (-1..=7).find_map(|i: i32| {
            let low = start + eighth * f64::from(i);
            if fraction > low && fraction <= low + eighth {
                Some(match i {
                    0..=6 => Self::ORDER[i as usize],
                    _ => Self::NewMoon,
                })
            } else {
                None
            }
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NewMoon => "New moon",
            Self::WaxingCrescent => "Waxing crescent",
            Self::FirstQuarter => "First quarter",
            Self::WaxingGibbous => "Waxing gibbous",
            Self::FullMoon => "Full moon",
            Self::WaningGibbous => "Waning gibbous",
            Self::LastQuarter => "Last quarter",
            Self::WaningCrescent => "Waning crescent",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunInfo {
    pub sunrise_ms: Option<i64>,
    pub sunset_ms: Option<i64>,
    pub now_ms: Option<i64>,
    pub moon_phase: Option<MoonPhase>,
}

impl SunInfo {
    /// Sun position on its arc between sunrise (0) and sunset (180).
    pub fn sun_angle(&self) -> f64 {
        match (self.sunrise_ms, self.sunset_ms) {
            (Some(sunrise), Some(sunset)) => {
                crate::timeline::sun_angle(sunrise, sunset, self.now_ms.unwrap_or(sunrise))
            }
            _ => 0.0,
        }
    }
}

pub fn to_fahrenheit(celsius: f64) -> i64 {
    (celsius * 1.8 + 32.0).round() as i64
}

/// Whole degrees in the chosen unit, e.g. `"12°"`.
pub fn format_temperature(celsius: Option<f64>, unit: TemperatureUnit) -> String {
    match celsius {
        None => format!("{NOT_AVAILABLE}°"),
        Some(c) => match unit {
            TemperatureUnit::Celsius => format!("{}°", c.round() as i64),
            TemperatureUnit::Fahrenheit => format!("{}°", to_fahrenheit(c)),
        },
    }
}

/// `"2°/12°"`, or `"N/A"` unless both ends are known.
pub fn format_min_max(min: Option<f64>, max: Option<f64>, unit: TemperatureUnit) -> String {
    match (min, max) {
        (Some(_), Some(_)) => format!(
            "{}/{}",
            format_temperature(min, unit),
            format_temperature(max, unit)
        ),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Clock time of a local instant.
pub fn format_hour(local_ms: Option<i64>, format: TimeFormat) -> String {
    let Some(time) = local_ms.and_then(DateTime::from_timestamp_millis) else {
        return "n/a".to_string();
    };
    let pattern = match format {
        TimeFormat::AmPm => "%I:%M %p",
        TimeFormat::Hours24 => "%H:%M",
    };
    time.format(pattern).to_string()
}

pub fn format_day_name(local_ms: Option<i64>, short: bool) -> String {
    match local_ms.and_then(DateTime::from_timestamp_millis) {
        Some(time) => time.format(if short { "%a" } else { "%A" }).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2022-02-19 (Saturday) 13:30:00 UTC
    const SATURDAY_AFTERNOON: i64 = 1_645_277_400_000;

    #[test]
    fn test_format_temperature() {
        assert_eq!(format_temperature(Some(12.4), TemperatureUnit::Celsius), "12°");
        assert_eq!(format_temperature(Some(-0.6), TemperatureUnit::Celsius), "-1°");
        assert_eq!(format_temperature(Some(10.0), TemperatureUnit::Fahrenheit), "50°");
        assert_eq!(format_temperature(None, TemperatureUnit::Celsius), "N/A°");
    }

    #[test]
    fn test_format_min_max() {
        let unit = TemperatureUnit::Celsius;
        assert_eq!(format_min_max(Some(2.2), Some(11.8), unit), "2°/12°");
        assert_eq!(format_min_max(None, Some(11.8), unit), "N/A");
    }

    #[test]
    fn test_format_hour() {
        let t = Some(SATURDAY_AFTERNOON);
        assert_eq!(format_hour(t, TimeFormat::AmPm), "01:30 PM");
        assert_eq!(format_hour(t, TimeFormat::Hours24), "13:30");
        assert_eq!(format_hour(None, TimeFormat::Hours24), "n/a");
    }

    #[test]
    fn test_day_names() {
        let day = DailyInfo {
            time_ms: Some(SATURDAY_AFTERNOON),
            ..DailyInfo::default()
        };
        assert_eq!(day.day_name(), "Saturday");
        assert_eq!(day.short_day_name(), "Sat");
        assert_eq!(DailyInfo::default().day_name(), "N/A");
    }

    #[test]
    fn test_comfort_and_wind_text() {
        let comfort = ComfortInfo {
            humidity: Some(60.0),
            feels_like: Some(10.0),
            uvi: Some(1.5),
        };
        assert_eq!(comfort.feels_like_text(TemperatureUnit::Celsius), "10 °C");
        assert_eq!(comfort.feels_like_text(TemperatureUnit::Fahrenheit), "50 °F");
        assert_eq!(comfort.uvi_text(), "1.5 uv");
        assert_eq!(ComfortInfo::default().uvi_text(), "N/A");

        let wind = WindInfo {
            deg: Some(270.0),
            speed: Some(4.5),
        };
        assert_eq!(wind.deg_text(), "270 °");
        assert_eq!(wind.speed_text(TemperatureUnit::Celsius), "4.5 m/s");
        assert_eq!(wind.speed_text(TemperatureUnit::Fahrenheit), "10 mph");
        assert_eq!(WindInfo::default().speed_text(TemperatureUnit::Celsius), "N/A");
    }

    #[test]
    fn test_moon_phase_lookup() {
        assert_eq!(MoonPhase::from_fraction(0.0), Some(MoonPhase::NewMoon));
        assert_eq!(MoonPhase::from_fraction(1.0), Some(MoonPhase::NewMoon));
        assert_eq!(MoonPhase::from_fraction(0.125), Some(MoonPhase::WaxingCrescent));
        assert_eq!(MoonPhase::from_fraction(0.25), Some(MoonPhase::FirstQuarter));
        assert_eq!(MoonPhase::from_fraction(0.5), Some(MoonPhase::FullMoon));
        assert_eq!(MoonPhase::from_fraction(0.75), Some(MoonPhase::LastQuarter));
        assert_eq!(MoonPhase::from_fraction(0.9), Some(MoonPhase::WaningCrescent));
        assert_eq!(MoonPhase::from_fraction(1.5), None);
    }

    #[test]
    fn test_default_info_has_fixed_slots() {
        let info = WeatherInfo::default();
        assert_eq!(info.next_days.len(), NEXT_DAYS);
        assert_eq!(info.next_hours.len(), NEXT_HOURS);
        assert_eq!(info.current.title, "None");
    }

    #[test]
    fn test_sun_angle() {
        let sun = SunInfo {
            sunrise_ms: Some(0),
            sunset_ms: Some(1000),
            now_ms: Some(250),
            moon_phase: None,
        };
        assert_eq!(sun.sun_angle(), 45.0);
        assert_eq!(SunInfo::default().sun_angle(), 0.0);
    }
}
