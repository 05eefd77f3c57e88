//! Time-zone-aware helpers.
//!
//! All instants are UTC epoch milliseconds. A "local" instant is a UTC
//! instant shifted by the remote location's offset, so reading its UTC
//! calendar fields gives the wall clock at that location. The device time
//! zone never takes part.

use serde::{Deserialize, Serialize};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Position of the sun relative to the location's sunrise and sunset hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeState {
    #[default]
    Day,
    Night,
    Sunrise,
    Sunset,
}

impl TimeState {
    /// Sunrise and sunset hours count as day.
    pub fn is_day(self) -> bool {
        !matches!(self, TimeState::Night)
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn with_offset(t: i64, offset_ms: i64) -> i64 {
    t.saturating_add(offset_ms)
}

/// Hour of the UTC day (0..=23).
pub fn hour_of_day(t: i64) -> u32 {
    (t.rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_HOUR) as u32
}

/// Start of the UTC hour containing `t`.
pub fn start_of_hour(t: i64) -> i64 {
    t - t.rem_euclid(MILLIS_PER_HOUR)
}

/// Day/night state of `at`, compared hour by hour with sunrise and sunset
/// on the location's clock.
pub fn time_state(sunrise: i64, sunset: i64, at: i64, offset_ms: i64) -> TimeState {
    let sunrise_hour = hour_of_day(with_offset(sunrise, offset_ms));
    let sunset_hour = hour_of_day(with_offset(sunset, offset_ms));
    let hour = hour_of_day(with_offset(at, offset_ms));

    if hour == sunrise_hour {
        TimeState::Sunrise
    } else if hour == sunset_hour {
        TimeState::Sunset
    } else if hour > sunrise_hour && hour < sunset_hour {
        TimeState::Day
    } else {
        TimeState::Night
    }
}

/// Whether two instants fall on the same UTC calendar day.
pub fn days_match(a: i64, b: i64) -> bool {
    a.div_euclid(MILLIS_PER_DAY) == b.div_euclid(MILLIS_PER_DAY)
}

pub fn midday(sunrise: i64, sunset: i64) -> i64 {
    sunrise + (sunset - sunrise) / 2
}

/// Linear mapping of `value` from one range onto another.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Angle of the sun on a half circle: 0 at sunrise, 180 at sunset.
pub fn sun_angle(sunrise: i64, sunset: i64, current: i64) -> f64 {
    if sunset <= sunrise {
        return 0.0;
    }
    let clamped = current.clamp(sunrise, sunset);
    map_range(clamped as f64, sunrise as f64, sunset as f64, 0.0, 180.0)
}

/// How long ago the last refresh happened, in the largest whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAge {
    Never,
    Days(i64),
    Hours(i64),
    Minutes(i64),
    Seconds(i64),
    JustNow,
}

impl UpdateAge {
    /// Ages above this many days read as "never updated".
    pub const MAX_DAYS: i64 = 100;

    pub fn since(last_updated_ms: i64, now_ms: i64) -> Self {
        let elapsed = now_ms.saturating_sub(last_updated_ms).max(0);
        let days = elapsed / MILLIS_PER_DAY;
        if days > Self::MAX_DAYS {
            return Self::Never;
        }
        if days > 0 {
            return Self::Days(days);
        }
        let hours = elapsed / MILLIS_PER_HOUR;
        if hours > 0 {
            return Self::Hours(hours);
        }
        let minutes = elapsed / MILLIS_PER_MINUTE;
        if minutes > 0 {
            return Self::Minutes(minutes);
        }
        let seconds = elapsed / MILLIS_PER_SECOND;
        if seconds > 0 {
            return Self::Seconds(seconds);
        }
        Self::JustNow
    }
}

impl std::fmt::Display for UpdateAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn unit(f: &mut std::fmt::Formatter<'_>, n: i64, name: &str) -> std::fmt::Result {
            let plural = if n == 1 { "" } else { "s" };
            write!(f, "Updated {n} {name}{plural} ago")
        }
        match *self {
            Self::Never => write!(f, "No update"),
            Self::Days(n) => unit(f, n, "day"),
            Self::Hours(n) => unit(f, n, "hour"),
            Self::Minutes(n) => unit(f, n, "minute"),
            Self::Seconds(n) => unit(f, n, "second"),
            Self::JustNow => write!(f, "Updated just now"),
        }
    }
}
