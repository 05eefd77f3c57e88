//! Icon codes and background palettes derived from weather conditions.
//!
//! OpenWeatherMap icon codes are two digits plus `d` or `n`
//! (`01d` clear sky by day, `10n` rain at night, ...).

use serde::{Deserialize, Serialize};

use crate::timeline::map_range;

const KNOWN_ICONS: &[&str] = &["01", "02", "03", "04", "09", "10", "11", "13", "50"];

/// Switch a known icon code to its day or night variant. Unknown codes
/// fall back to clear sky.
pub fn align_icon(icon: &str, is_day: bool) -> String {
    let suffix = if is_day { 'd' } else { 'n' };
    let base = icon
        .strip_suffix('d')
        .or_else(|| icon.strip_suffix('n'))
        .filter(|base| KNOWN_ICONS.contains(base))
        .unwrap_or("01");
    format!("{base}{suffix}")
}

/// Short terminal symbol for an icon code.
pub fn glyph(icon: &str) -> &'static str {
    match icon {
        "01d" => "☀",
        "01n" => "☾",
        "02d" => "🌤",
        "02n" | "03d" | "03n" => "☁",
        "04d" | "04n" => "☁☁",
        "09d" | "09n" => "🌧",
        "10d" => "🌦",
        "10n" => "🌧",
        "11d" | "11n" => "⛈",
        "13d" | "13n" => "❄",
        "50d" | "50n" => "🌫",
        _ => "☀",
    }
}

/// A color in the HSL model: hue in degrees, saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub const fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Convert to 8-bit sRGB components.
    pub fn to_rgb(self) -> [u8; 3] {
        let channel = |n: f32| {
            let k = (n + self.hue / 30.0) % 12.0;
            let a = self.saturation * self.lightness.min(1.0 - self.lightness);
            let value = self.lightness - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        [channel(0.0), channel(8.0), channel(4.0)]
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    fn scaled(self, factor: f32) -> Self {
        Self {
            lightness: self.lightness * factor,
            ..self
        }
    }
}

/// Top and bottom colors of the background gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backdrop {
    pub top: Hsl,
    pub bottom: Hsl,
}

impl Backdrop {
    pub const CLEAR: Self = Self::new(Hsl::new(225.0, 0.90, 0.19), Hsl::new(212.0, 0.50, 0.45));
    pub const CLOUDY: Self = Self::new(Hsl::new(222.0, 0.85, 0.10), Hsl::new(212.0, 0.41, 0.37));
    pub const RAINY: Self = Self::new(Hsl::new(190.0, 0.43, 0.11), Hsl::new(190.0, 0.21, 0.35));
    pub const SNOWY: Self = Self::new(Hsl::new(205.0, 0.60, 0.15), Hsl::new(202.0, 0.28, 0.41));
    pub const CLEAR_NIGHT: Self =
        Self::new(Hsl::new(210.0, 1.0, 0.01), Hsl::new(211.0, 1.0, 0.15));

    const MIN_LIGHTNESS: f32 = 0.2;
    const MAX_LIGHTNESS: f32 = 1.0;

    pub const fn new(top: Hsl, bottom: Hsl) -> Self {
        Self { top, bottom }
    }

    /// Palette for an icon code. Every night icon shares the night palette.
    pub fn for_icon(icon: &str) -> Self {
        match icon {
            "01d" | "02d" | "03d" | "10d" => Self::CLEAR,
            "04d" | "50d" => Self::CLOUDY,
            "09d" | "11d" => Self::RAINY,
            "13d" => Self::SNOWY,
            i if i.ends_with('n') && KNOWN_ICONS.contains(&&i[..i.len() - 1]) => {
                Self::CLEAR_NIGHT
            }
            _ => Self::CLEAR,
        }
    }

    /// Darken towards sunrise and sunset: full lightness at midday, 20%
    /// at the edges and outside daylight.
    pub fn dimmed_for_sun(self, sunrise: i64, sunset: i64, now: i64) -> Self {
        if sunset <= sunrise {
            return self;
        }
        let clamped = now.clamp(sunrise, sunset);
        let sun = ((clamped - sunrise) as f64 / (sunset - sunrise) as f64) as f32;

        let factor = if sun < 0.5 {
            map_range(sun as f64, 0.0, 0.5, Self::MIN_LIGHTNESS as f64, Self::MAX_LIGHTNESS as f64)
        } else {
            map_range(sun as f64, 0.5, 1.0, Self::MAX_LIGHTNESS as f64, Self::MIN_LIGHTNESS as f64)
        } as f32;

        Self {
            top: self.top.scaled(factor),
            bottom: self.bottom.scaled(factor),
        }
    }
}

impl Default for Backdrop {
    fn default() -> Self {
        Self::CLEAR
    }
}
