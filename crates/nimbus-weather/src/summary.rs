//! Builds the display model from a cached forecast.
//!
//! The API returns hourly entries starting at the hour it was called and
//! daily entries starting today, so a forecast read back from the cache
//! hours later is realigned against the current time on the location's
//! clock before display.

use crate::condition::{align_icon, Backdrop};
use crate::info::{
    ComfortInfo, CurrentInfo, DailyInfo, HourlyIcon, HourlyInfo, MoonPhase, SunInfo, WeatherInfo,
    WindInfo, NEXT_DAYS, NEXT_HOURS,
};
use crate::records::{ConditionRecord, DailyBundle, ForecastBundle};
use crate::timeline::{days_match, midday, start_of_hour, time_state, with_offset, TimeState};

/// Sunrise and sunset of the day used for day/night decisions.
#[derive(Debug, Clone, Copy)]
struct SunWindow {
    sunrise: i64,
    sunset: i64,
}

impl SunWindow {
    fn state(self, at: i64, offset_ms: i64) -> TimeState {
        time_state(self.sunrise, self.sunset, at, offset_ms)
    }
}

fn sun_window(sunrise: Option<i64>, sunset: Option<i64>) -> Option<SunWindow> {
    Some(SunWindow {
        sunrise: sunrise?,
        sunset: sunset?,
    })
}

fn first_icon(conditions: &[ConditionRecord]) -> Option<&str> {
    conditions.first().and_then(|c| c.icon.as_deref())
}

/// The daily entry covering the local calendar day of `local_now`.
fn find_today(daily: &[DailyBundle], offset_ms: i64, local_now: i64) -> Option<usize> {
    daily.iter().position(|entry| {
        let d = &entry.daily;
        let reference = match (d.sunrise_ms, d.sunset_ms) {
            (Some(sunrise), Some(sunset)) => Some(midday(sunrise, sunset)),
            _ => d.dt_ms,
        };
        reference.is_some_and(|t| days_match(with_offset(t, offset_ms), local_now))
    })
}

pub fn summarize(bundle: &ForecastBundle, now_ms: i64) -> WeatherInfo {
    let offset = bundle.offset_ms();
    let local_now = with_offset(now_ms, offset);

    let today_index = find_today(&bundle.daily, offset, local_now);
    let today = today_index.map(|i| &bundle.daily[i]);
    let current = bundle.current.as_ref();

    let sun = today
        .or_else(|| bundle.daily.first())
        .and_then(|d| sun_window(d.daily.sunrise_ms, d.daily.sunset_ms))
        .or_else(|| current.and_then(|c| sun_window(c.current.sunrise_ms, c.current.sunset_ms)));
    let state = sun.map_or(TimeState::Day, |s| s.state(now_ms, offset));
    let is_day = state.is_day();

    // current box
    let current_condition = current
        .and_then(|c| c.conditions.first())
        .or_else(|| today.and_then(|d| d.conditions.first()));
    let defaults = CurrentInfo::default();
    let current_info = CurrentInfo {
        temperature: current
            .and_then(|c| c.current.temp)
            .or_else(|| today.and_then(|d| d.temp.day)),
        min: today.and_then(|d| d.temp.min),
        max: today.and_then(|d| d.temp.max),
        title: current_condition
            .and_then(|c| c.main.clone())
            .unwrap_or(defaults.title),
        subtitle: current_condition
            .and_then(|c| c.description.clone())
            .unwrap_or(defaults.subtitle),
        icon: align_icon(
            current_condition
                .and_then(|c| c.icon.as_deref())
                .unwrap_or(defaults.icon.as_str()),
            is_day,
        ),
        time_state: state,
    };

    let next_hours = next_hours(bundle, sun, offset, local_now);
    let next_days = next_days(bundle, today_index, offset, local_now, is_day);

    let comfort = ComfortInfo {
        humidity: current
            .and_then(|c| c.current.humidity)
            .or_else(|| today.and_then(|d| d.daily.humidity)),
        feels_like: current
            .and_then(|c| c.current.feels_like)
            .or_else(|| today.and_then(|d| d.feels_like.day)),
        uvi: current
            .and_then(|c| c.current.uvi)
            .or_else(|| today.and_then(|d| d.daily.uvi)),
    };

    let wind = WindInfo {
        deg: current
            .and_then(|c| c.current.wind_deg)
            .or_else(|| today.and_then(|d| d.daily.wind_deg)),
        speed: current
            .and_then(|c| c.current.wind_speed)
            .or_else(|| today.and_then(|d| d.daily.wind_speed)),
    };

    let sun_info = SunInfo {
        sunrise_ms: today
            .and_then(|d| d.daily.sunrise_ms)
            .map(|t| with_offset(t, offset)),
        sunset_ms: today
            .and_then(|d| d.daily.sunset_ms)
            .map(|t| with_offset(t, offset)),
        now_ms: Some(local_now),
        moon_phase: today
            .and_then(|d| d.daily.moon_phase)
            .and_then(MoonPhase::from_fraction),
    };

    WeatherInfo {
        city_name: bundle.response.city_name.clone(),
        fetched_at_ms: bundle.response.fetched_at_ms,
        backdrop: Backdrop::for_icon(&current_info.icon),
        current: current_info,
        next_days,
        next_hours,
        comfort,
        wind,
        sun: sun_info,
    }
}

fn next_hours(
    bundle: &ForecastBundle,
    sun: Option<SunWindow>,
    offset: i64,
    local_now: i64,
) -> Vec<HourlyInfo> {
    let hour_start = start_of_hour(local_now) - offset;
    let first = bundle
        .hourly
        .iter()
        .position(|h| h.hourly.dt_ms.is_some_and(|dt| dt >= hour_start))
        .unwrap_or(bundle.hourly.len());

    let mut hours: Vec<HourlyInfo> = bundle.hourly[first..]
        .iter()
        .take(NEXT_HOURS)
        .map(|entry| {
            let dt = entry.hourly.dt_ms;
            let hour_state = match (sun, dt) {
                (Some(sun), Some(dt)) => sun.state(dt, offset),
                _ => TimeState::Day,
            };
            let icon = match hour_state {
                TimeState::Sunrise => HourlyIcon::Sunrise,
                TimeState::Sunset => HourlyIcon::Sunset,
                _ => match first_icon(&entry.conditions) {
                    Some(icon) => HourlyIcon::Condition(align_icon(icon, hour_state.is_day())),
                    None => HourlyIcon::None,
                },
            };
            HourlyInfo {
                time_ms: dt.map(|t| with_offset(t, offset)),
                temperature: entry.hourly.temp,
                icon,
            }
        })
        .collect();

    hours.resize(NEXT_HOURS, HourlyInfo::default());
    hours
}

fn next_days(
    bundle: &ForecastBundle,
    today_index: Option<usize>,
    offset: i64,
    local_now: i64,
    is_day: bool,
) -> Vec<DailyInfo> {
    let first = match today_index {
        Some(i) => i + 1,
        None => bundle
            .daily
            .iter()
            .position(|d| {
                d.daily
                    .dt_ms
                    .is_some_and(|dt| with_offset(dt, offset) > local_now)
            })
            .unwrap_or(bundle.daily.len()),
    };

    let mut days: Vec<DailyInfo> = bundle.daily[first..]
        .iter()
        .take(NEXT_DAYS)
        .map(|entry| DailyInfo {
            time_ms: entry.daily.dt_ms.map(|t| with_offset(t, offset)),
            min: entry.temp.min,
            max: entry.temp.max,
            icon: first_icon(&entry.conditions).map(|icon| align_icon(icon, is_day)),
        })
        .collect();

    days.resize(NEXT_DAYS, DailyInfo::default());
    days
}
