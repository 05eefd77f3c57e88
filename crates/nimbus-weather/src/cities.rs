//! Import of the OpenWeatherMap `city.list.json` bulk file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::cache::WeatherCache;
use crate::records::City;

#[derive(Debug, Deserialize)]
struct CityEntry {
    id: i32,
    name: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    country: String,
    coord: CoordEntry,
}

#[derive(Debug, Deserialize)]
struct CoordEntry {
    lat: f64,
    lon: f64,
}

impl From<CityEntry> for City {
    fn from(entry: CityEntry) -> Self {
        City {
            id: entry.id,
            name: entry.name,
            state: entry.state.filter(|s| !s.trim().is_empty()),
            country: entry.country,
            lat: entry.coord.lat,
            lon: entry.coord.lon,
        }
    }
}

/// Parse the JSON array of the bulk city list.
pub fn parse_city_list(json: &str) -> Result<Vec<City>> {
    let entries: Vec<CityEntry> =
        serde_json::from_str(json).context("Failed to parse city list")?;
    Ok(entries.into_iter().map(City::from).collect())
}

/// Read a city list file and store every city. Returns the number stored.
pub fn import_city_list(cache: &mut WeatherCache, path: &Path) -> Result<usize> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cities = parse_city_list(&json)?;
    let stored = cache.store_cities(&cities)?;
    tracing::info!(count = stored, file = %path.display(), "Cities imported");
    Ok(stored)
}
