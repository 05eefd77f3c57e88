//! Terminal rendering of a forecast.

use nimbus_core::Settings;
use nimbus_weather::{
    format_hour, format_min_max, format_temperature, glyph, HourlyIcon, HourlyInfo, UpdateAge,
    WeatherInfo,
};

/// Where the shown forecast came from.
pub struct Freshness {
    pub cached: bool,
    pub error: Option<String>,
    pub now_ms: i64,
}

fn hourly_glyph(hour: &HourlyInfo) -> &str {
    match &hour.icon {
        HourlyIcon::Condition(icon) => glyph(icon),
        HourlyIcon::Sunrise => "↑☀",
        HourlyIcon::Sunset => "↓☀",
        HourlyIcon::None => " ",
    }
}

pub fn render(info: &WeatherInfo, settings: &Settings, freshness: &Freshness) -> String {
    let unit = settings.temperature_unit;
    let time_format = settings.time_format;
    let current = &info.current;
    let mut lines = Vec::new();

    lines.push(format!("{}  {} {}", info.city_name, glyph(&current.icon), current.title));
    lines.push(format!(
        "  {}   {}   {}",
        format_temperature(current.temperature, unit),
        format_min_max(current.min, current.max, unit),
        current.subtitle
    ));

    let mut status = UpdateAge::since(info.fetched_at_ms, freshness.now_ms).to_string();
    if freshness.cached {
        status.push_str(" (cached)");
    }
    lines.push(format!("  {status}"));
    if let Some(error) = &freshness.error {
        lines.push(format!("  ! {error}"));
    }

    let backdrop = match (info.sun.sunrise_ms, info.sun.sunset_ms, info.sun.now_ms) {
        (Some(sunrise), Some(sunset), Some(now)) => {
            info.backdrop.dimmed_for_sun(sunrise, sunset, now)
        }
        _ => info.backdrop,
    };
    lines.push(format!(
        "  Sky {} -> {}",
        backdrop.top.to_hex(),
        backdrop.bottom.to_hex()
    ));

    if settings.show_next_24_hours {
        lines.push(String::new());
        lines.push("Next 24 hours".to_string());
        for hour in info.next_hours.iter().filter(|h| h.time_ms.is_some()) {
            lines.push(format!(
                "  {:>8}  {:<2}  {}",
                format_hour(hour.time_ms, time_format),
                hourly_glyph(hour),
                format_temperature(hour.temperature, unit)
            ));
        }
    }

    if settings.show_next_4_days {
        lines.push(String::new());
        lines.push("Next 4 days".to_string());
        for day in info.next_days.iter().filter(|d| d.time_ms.is_some()) {
            lines.push(format!(
                "  {:<10}  {:<2}  {}",
                day.day_name(),
                day.icon.as_deref().map_or(" ", glyph),
                format_min_max(day.min, day.max, unit)
            ));
        }
    }

    if settings.show_comfort_level {
        let comfort = &info.comfort;
        let humidity = comfort
            .humidity
            .map_or_else(|| "N/A".to_string(), |h| format!("{h}%"));
        lines.push(String::new());
        lines.push("Comfort level".to_string());
        lines.push(format!(
            "  Humidity {}   Feels like {}   UV index {}",
            humidity,
            comfort.feels_like_text(unit),
            comfort.uvi_text()
        ));
    }

    if settings.show_wind {
        lines.push(String::new());
        lines.push("Wind".to_string());
        lines.push(format!(
            "  Direction {}   Speed {}",
            info.wind.deg_text(),
            info.wind.speed_text(unit)
        ));
    }

    if settings.show_sunrise_sunset {
        let sun = &info.sun;
        lines.push(String::new());
        lines.push("Sunrise & sunset".to_string());
        lines.push(format!(
            "  Sunrise {}   Sunset {}   Sun at {:.0}°",
            format_hour(sun.sunrise_ms, time_format),
            format_hour(sun.sunset_ms, time_format),
            sun.sun_angle()
        ));
        if let Some(phase) = sun.moon_phase {
            lines.push(format!("  Moon: {}", phase.label()));
        }
    }

    lines.join("\n")
}
