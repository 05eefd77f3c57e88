//! SQLite cache for forecasts and the city list.
//!
//! A forecast is spread over several tables. Forecast rows carry a `mask_id`
//! (see [`MaskedKey`]) that links them to their temperature, feels-like and
//! condition rows. Replacing a city's forecast deletes all of its rows and
//! inserts the new ones inside one transaction, so readers never observe a
//! half-written forecast.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;

use nimbus_core::error::{DatabaseError, RusqliteErrorExt};

use crate::mask::MaskedKey;
use crate::records::{
    City, ConditionRecord, CurrentBundle, CurrentRecord, DailyBundle, DailyRecord,
    FeelsLikeRecord, ForecastBundle, HourlyBundle, HourlyRecord, ResponseRecord, TempRecord,
};

/// Maximum number of cities returned by a name search.
pub const CITY_SEARCH_LIMIT: usize = 10;

/// Tables holding forecast rows keyed by `city_id`.
const FORECAST_TABLES: &[&str] = &[
    "current",
    "hourly",
    "daily",
    "weather_condition",
    "feels_like",
    "temperature",
];

pub struct WeatherCache {
    conn: Connection,
}

impl WeatherCache {
    /// Open (or create) the cache at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Like [`new`](Self::new), with the failure classified for display.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        Self::new(path).map_err(|e| match e.downcast::<rusqlite::Error>() {
            Ok(err) => err.into_database_error(),
            Err(err) => DatabaseError::ConnectionFailed(format!("{err:#}")),
        })
    }

    /// In-memory cache (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS city (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                state TEXT,
                country TEXT NOT NULL,
                lat REAL NOT NULL,
                lon REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS api_response (
                city_id INTEGER PRIMARY KEY,
                city_name TEXT NOT NULL,
                lat REAL,
                lon REAL,
                timezone TEXT,
                timezone_offset INTEGER,
                fetched_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS current (
                city_id INTEGER PRIMARY KEY,
                slot INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                dt INTEGER,
                sunrise INTEGER,
                sunset INTEGER,
                temp REAL,
                feels_like REAL,
                pressure REAL,
                humidity REAL,
                dew_point REAL,
                clouds REAL,
                uvi REAL,
                visibility REAL,
                wind_speed REAL,
                wind_gust REAL,
                wind_deg REAL,
                rain REAL,
                snow REAL
            );

            CREATE TABLE IF NOT EXISTS daily (
                city_id INTEGER NOT NULL,
                slot INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                dt INTEGER,
                sunrise INTEGER,
                sunset INTEGER,
                moonrise INTEGER,
                moonset INTEGER,
                moon_phase REAL,
                pressure REAL,
                humidity REAL,
                dew_point REAL,
                wind_speed REAL,
                wind_gust REAL,
                wind_deg REAL,
                clouds REAL,
                uvi REAL,
                pop REAL,
                rain REAL,
                snow REAL,
                PRIMARY KEY (city_id, slot)
            );

            CREATE TABLE IF NOT EXISTS hourly (
                city_id INTEGER NOT NULL,
                slot INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                dt INTEGER,
                temp REAL,
                feels_like REAL,
                pressure REAL,
                humidity REAL,
                dew_point REAL,
                uvi REAL,
                clouds REAL,
                visibility REAL,
                wind_speed REAL,
                wind_gust REAL,
                wind_deg REAL,
                pop REAL,
                rain REAL,
                snow REAL,
                PRIMARY KEY (city_id, slot)
            );

            CREATE TABLE IF NOT EXISTS temperature (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                morn REAL,
                day REAL,
                eve REAL,
                night REAL,
                min REAL,
                max REAL
            );

            CREATE TABLE IF NOT EXISTS feels_like (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                morn REAL,
                day REAL,
                eve REAL,
                night REAL
            );

            CREATE TABLE IF NOT EXISTS weather_condition (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                mask_id INTEGER NOT NULL,
                condition_id INTEGER,
                main TEXT,
                description TEXT,
                icon TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_city_name ON city(name);
            CREATE INDEX IF NOT EXISTS idx_temperature_city ON temperature(city_id);
            CREATE INDEX IF NOT EXISTS idx_temperature_mask ON temperature(mask_id);
            CREATE INDEX IF NOT EXISTS idx_feels_like_city ON feels_like(city_id);
            CREATE INDEX IF NOT EXISTS idx_feels_like_mask ON feels_like(mask_id);
            CREATE INDEX IF NOT EXISTS idx_condition_city ON weather_condition(city_id);
            CREATE INDEX IF NOT EXISTS idx_condition_mask ON weather_condition(mask_id);
            "#,
        )?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Forecasts
    // ---------------------------------------------------------------------

    /// Replace everything cached for the bundle's city with the bundle.
    pub fn replace_forecast(&mut self, bundle: &ForecastBundle) -> Result<()> {
        let city_id = bundle.city_id();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        delete_forecast_rows(&tx, city_id)?;
        insert_response(&tx, &bundle.response)?;

        if let Some(current) = &bundle.current {
            insert_current(&tx, &current.current)?;
            insert_conditions(&tx, &current.conditions)?;
        }
        for daily in &bundle.daily {
            insert_daily(&tx, &daily.daily)?;
            insert_temp(&tx, &daily.temp)?;
            insert_feels_like(&tx, &daily.feels_like)?;
            insert_conditions(&tx, &daily.conditions)?;
        }
        for hourly in &bundle.hourly {
            insert_hourly(&tx, &hourly.hourly)?;
            insert_conditions(&tx, &hourly.conditions)?;
        }

        tx.commit()?;
        tracing::debug!(
            city_id,
            daily = bundle.daily.len(),
            hourly = bundle.hourly.len(),
            "Forecast cached"
        );
        Ok(())
    }

    /// Load the cached forecast of a city, if any.
    pub fn load_forecast(&self, city_id: i32) -> Result<Option<ForecastBundle>> {
        let response = self
            .conn
            .query_row(
                "SELECT city_id, city_name, lat, lon, timezone, timezone_offset, fetched_at
                 FROM api_response WHERE city_id = ?1",
                params![city_id],
                row_to_response,
            )
            .optional()?;

        let Some(response) = response else {
            return Ok(None);
        };

        let mut conditions = self.conditions_by_mask(city_id)?;
        let mut temps = self.temps_by_mask(city_id)?;
        let mut feels = self.feels_like_by_mask(city_id)?;

        let current = self
            .conn
            .query_row(
                "SELECT city_id, slot, dt, sunrise, sunset, temp, feels_like, pressure, humidity,
                        dew_point, clouds, uvi, visibility, wind_speed, wind_gust, wind_deg,
                        rain, snow
                 FROM current WHERE city_id = ?1",
                params![city_id],
                row_to_current,
            )
            .optional()?
            .map(|current| CurrentBundle {
                conditions: conditions.remove(&current.mask()).unwrap_or_default(),
                current,
            });

        let daily = {
            let mut stmt = self.conn.prepare(
                "SELECT city_id, slot, dt, sunrise, sunset, moonrise, moonset, moon_phase,
                        pressure, humidity, dew_point, wind_speed, wind_gust, wind_deg, clouds,
                        uvi, pop, rain, snow
                 FROM daily WHERE city_id = ?1 ORDER BY slot",
            )?;
            let rows = stmt.query_map(params![city_id], row_to_daily)?;
            rows.collect::<Result<Vec<_>, _>>()
                .context("Failed to read daily forecast")?
        };

        let daily = daily
            .into_iter()
            .map(|daily| {
                let mask = daily.mask();
                DailyBundle {
                    temp: temps.remove(&mask).unwrap_or_else(|| TempRecord::empty(mask)),
                    feels_like: feels
                        .remove(&mask)
                        .unwrap_or_else(|| FeelsLikeRecord::empty(mask)),
                    conditions: conditions.remove(&mask).unwrap_or_default(),
                    daily,
                }
            })
            .collect();

        let hourly = {
            let mut stmt = self.conn.prepare(
                "SELECT city_id, slot, dt, temp, feels_like, pressure, humidity, dew_point, uvi,
                        clouds, visibility, wind_speed, wind_gust, wind_deg, pop, rain, snow
                 FROM hourly WHERE city_id = ?1 ORDER BY slot",
            )?;
            let rows = stmt.query_map(params![city_id], row_to_hourly)?;
            rows.collect::<Result<Vec<_>, _>>()
                .context("Failed to read hourly forecast")?
        };

        let hourly = hourly
            .into_iter()
            .map(|hourly| HourlyBundle {
                conditions: conditions.remove(&hourly.mask()).unwrap_or_default(),
                hourly,
            })
            .collect();

        Ok(Some(ForecastBundle {
            response,
            current,
            daily,
            hourly,
        }))
    }

    /// Load the cached forecast stored under a city name.
    pub fn load_forecast_by_name(&self, city_name: &str) -> Result<Option<ForecastBundle>> {
        let city_id: Option<i32> = self
            .conn
            .query_row(
                "SELECT city_id FROM api_response WHERE city_name = ?1
                 ORDER BY fetched_at DESC LIMIT 1",
                params![city_name],
                |row| row.get(0),
            )
            .optional()?;

        match city_id {
            Some(id) => self.load_forecast(id),
            None => Ok(None),
        }
    }

    /// Remove a city's forecast, including its response row.
    pub fn delete_forecast(&mut self, city_id: i32) -> Result<()> {
        let tx = self.conn.transaction()?;
        delete_forecast_rows(&tx, city_id)?;
        tx.execute("DELETE FROM api_response WHERE city_id = ?1", params![city_id])?;
        tx.commit()?;
        Ok(())
    }

    /// Response rows of all cached forecasts, newest first.
    pub fn cached_forecasts(&self) -> Result<Vec<ResponseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_id, city_name, lat, lon, timezone, timezone_offset, fetched_at
             FROM api_response ORDER BY fetched_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_response)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to read cached forecasts: {}", e))
    }

    /// Drop every forecast. Cities are kept.
    pub fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for table in FORECAST_TABLES.iter().chain(&["api_response"]) {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn conditions_by_mask(&self, city_id: i32) -> Result<HashMap<MaskedKey, Vec<ConditionRecord>>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_id, mask_id, condition_id, main, description, icon
             FROM weather_condition WHERE city_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok(ConditionRecord {
                city_id: row.get(0)?,
                mask: MaskedKey::from_raw(row.get(1)?),
                condition_id: row.get(2)?,
                main: row.get(3)?,
                description: row.get(4)?,
                icon: row.get(5)?,
            })
        })?;

        let mut by_mask: HashMap<MaskedKey, Vec<ConditionRecord>> = HashMap::new();
        for row in rows {
            let condition = row?;
            by_mask.entry(condition.mask).or_default().push(condition);
        }
        Ok(by_mask)
    }

    fn temps_by_mask(&self, city_id: i32) -> Result<HashMap<MaskedKey, TempRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_id, mask_id, morn, day, eve, night, min, max
             FROM temperature WHERE city_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok(TempRecord {
                city_id: row.get(0)?,
                mask: MaskedKey::from_raw(row.get(1)?),
                morn: row.get(2)?,
                day: row.get(3)?,
                eve: row.get(4)?,
                night: row.get(5)?,
                min: row.get(6)?,
                max: row.get(7)?,
            })
        })?;

        let mut by_mask = HashMap::new();
        for row in rows {
            let temp = row?;
            by_mask.entry(temp.mask).or_insert(temp);
        }
        Ok(by_mask)
    }

    fn feels_like_by_mask(&self, city_id: i32) -> Result<HashMap<MaskedKey, FeelsLikeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_id, mask_id, morn, day, eve, night
             FROM feels_like WHERE city_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![city_id], |row| {
            Ok(FeelsLikeRecord {
                city_id: row.get(0)?,
                mask: MaskedKey::from_raw(row.get(1)?),
                morn: row.get(2)?,
                day: row.get(3)?,
                eve: row.get(4)?,
                night: row.get(5)?,
            })
        })?;

        let mut by_mask = HashMap::new();
        for row in rows {
            let feels = row?;
            by_mask.entry(feels.mask).or_insert(feels);
        }
        Ok(by_mask)
    }

    // ---------------------------------------------------------------------
    // Cities
    // ---------------------------------------------------------------------

    /// Insert or replace cities. Returns the number stored.
    pub fn store_cities(&mut self, cities: &[City]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO city (id, name, state, country, lat, lon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for city in cities {
                stmt.execute(params![
                    city.id,
                    city.name,
                    city.state,
                    city.country,
                    city.lat,
                    city.lon
                ])?;
            }
        }
        tx.commit()?;
        Ok(cities.len())
    }

    /// Case-insensitive prefix search over city names.
    pub fn search_cities(&self, prefix: &str) -> Result<Vec<City>> {
        let pattern = glob_escape(prefix.trim());
        let mut stmt = self.conn.prepare(
            "SELECT id, name, state, country, lat, lon FROM city
             WHERE lower(name) GLOB lower(?1) || '*'
             ORDER BY name LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, CITY_SEARCH_LIMIT as i64], row_to_city)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Failed to search cities: {}", e))
    }

    pub fn city_by_id(&self, id: i32) -> Result<Option<City>> {
        let city = self
            .conn
            .query_row(
                "SELECT id, name, state, country, lat, lon FROM city WHERE id = ?1",
                params![id],
                row_to_city,
            )
            .optional()?;
        Ok(city)
    }

    pub fn city_count(&self) -> Result<u32> {
        let count: u32 = self
            .conn
            .query_row("SELECT COUNT(*) FROM city", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Escape GLOB metacharacters so user input only matches literally.
fn glob_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '*' | '?' | '[' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

fn delete_forecast_rows(conn: &Connection, city_id: i32) -> Result<()> {
    for table in FORECAST_TABLES {
        conn.execute(
            &format!("DELETE FROM {table} WHERE city_id = ?1"),
            params![city_id],
        )?;
    }
    Ok(())
}

fn insert_response(conn: &Connection, r: &ResponseRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO api_response
         (city_id, city_name, lat, lon, timezone, timezone_offset, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            r.city_id,
            r.city_name,
            r.lat,
            r.lon,
            r.timezone,
            r.timezone_offset_secs,
            r.fetched_at_ms
        ],
    )?;
    Ok(())
}

fn insert_current(conn: &Connection, c: &CurrentRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO current
         (city_id, slot, mask_id, dt, sunrise, sunset, temp, feels_like, pressure, humidity,
          dew_point, clouds, uvi, visibility, wind_speed, wind_gust, wind_deg, rain, snow)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19)",
        params![
            c.city_id,
            c.slot,
            c.mask().raw(),
            c.dt_ms,
            c.sunrise_ms,
            c.sunset_ms,
            c.temp,
            c.feels_like,
            c.pressure,
            c.humidity,
            c.dew_point,
            c.clouds,
            c.uvi,
            c.visibility,
            c.wind_speed,
            c.wind_gust,
            c.wind_deg,
            c.rain,
            c.snow
        ],
    )?;
    Ok(())
}

fn insert_daily(conn: &Connection, d: &DailyRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO daily
         (city_id, slot, mask_id, dt, sunrise, sunset, moonrise, moonset, moon_phase, pressure,
          humidity, dew_point, wind_speed, wind_gust, wind_deg, clouds, uvi, pop, rain, snow)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20)",
        params![
            d.city_id,
            d.slot,
            d.mask().raw(),
            d.dt_ms,
            d.sunrise_ms,
            d.sunset_ms,
            d.moonrise_ms,
            d.moonset_ms,
            d.moon_phase,
            d.pressure,
            d.humidity,
            d.dew_point,
            d.wind_speed,
            d.wind_gust,
            d.wind_deg,
            d.clouds,
            d.uvi,
            d.pop,
            d.rain,
            d.snow
        ],
    )?;
    Ok(())
}

fn insert_hourly(conn: &Connection, h: &HourlyRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO hourly
         (city_id, slot, mask_id, dt, temp, feels_like, pressure, humidity, dew_point, uvi,
          clouds, visibility, wind_speed, wind_gust, wind_deg, pop, rain, snow)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18)",
        params![
            h.city_id,
            h.slot,
            h.mask().raw(),
            h.dt_ms,
            h.temp,
            h.feels_like,
            h.pressure,
            h.humidity,
            h.dew_point,
            h.uvi,
            h.clouds,
            h.visibility,
            h.wind_speed,
            h.wind_gust,
            h.wind_deg,
            h.pop,
            h.rain,
            h.snow
        ],
    )?;
    Ok(())
}

fn insert_temp(conn: &Connection, t: &TempRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO temperature (city_id, mask_id, morn, day, eve, night, min, max)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![t.city_id, t.mask.raw(), t.morn, t.day, t.eve, t.night, t.min, t.max],
    )?;
    Ok(())
}

fn insert_feels_like(conn: &Connection, f: &FeelsLikeRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO feels_like (city_id, mask_id, morn, day, eve, night)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![f.city_id, f.mask.raw(), f.morn, f.day, f.eve, f.night],
    )?;
    Ok(())
}

fn insert_conditions(conn: &Connection, conditions: &[ConditionRecord]) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO weather_condition (city_id, mask_id, condition_id, main, description, icon)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for c in conditions {
        stmt.execute(params![
            c.city_id,
            c.mask.raw(),
            c.condition_id,
            c.main,
            c.description,
            c.icon
        ])?;
    }
    Ok(())
}

fn row_to_response(row: &rusqlite::Row) -> rusqlite::Result<ResponseRecord> {
    Ok(ResponseRecord {
        city_id: row.get(0)?,
        city_name: row.get(1)?,
        lat: row.get(2)?,
        lon: row.get(3)?,
        timezone: row.get(4)?,
        timezone_offset_secs: row.get(5)?,
        fetched_at_ms: row.get(6)?,
    })
}

fn row_to_current(row: &rusqlite::Row) -> rusqlite::Result<CurrentRecord> {
    Ok(CurrentRecord {
        city_id: row.get(0)?,
        slot: row.get(1)?,
        dt_ms: row.get(2)?,
        sunrise_ms: row.get(3)?,
        sunset_ms: row.get(4)?,
        temp: row.get(5)?,
        feels_like: row.get(6)?,
        pressure: row.get(7)?,
        humidity: row.get(8)?,
        dew_point: row.get(9)?,
        clouds: row.get(10)?,
        uvi: row.get(11)?,
        visibility: row.get(12)?,
        wind_speed: row.get(13)?,
        wind_gust: row.get(14)?,
        wind_deg: row.get(15)?,
        rain: row.get(16)?,
        snow: row.get(17)?,
    })
}

fn row_to_daily(row: &rusqlite::Row) -> rusqlite::Result<DailyRecord> {
    Ok(DailyRecord {
        city_id: row.get(0)?,
        slot: row.get(1)?,
        dt_ms: row.get(2)?,
        sunrise_ms: row.get(3)?,
        sunset_ms: row.get(4)?,
        moonrise_ms: row.get(5)?,
        moonset_ms: row.get(6)?,
        moon_phase: row.get(7)?,
        pressure: row.get(8)?,
        humidity: row.get(9)?,
        dew_point: row.get(10)?,
        wind_speed: row.get(11)?,
        wind_gust: row.get(12)?,
        wind_deg: row.get(13)?,
        clouds: row.get(14)?,
        uvi: row.get(15)?,
        pop: row.get(16)?,
        rain: row.get(17)?,
        snow: row.get(18)?,
    })
}

fn row_to_hourly(row: &rusqlite::Row) -> rusqlite::Result<HourlyRecord> {
    Ok(HourlyRecord {
        city_id: row.get(0)?,
        slot: row.get(1)?,
        dt_ms: row.get(2)?,
        temp: row.get(3)?,
        feels_like: row.get(4)?,
        pressure: row.get(5)?,
        humidity: row.get(6)?,
        dew_point: row.get(7)?,
        uvi: row.get(8)?,
        clouds: row.get(9)?,
        visibility: row.get(10)?,
        wind_speed: row.get(11)?,
        wind_gust: row.get(12)?,
        wind_deg: row.get(13)?,
        pop: row.get(14)?,
        rain: row.get(15)?,
        snow: row.get(16)?,
    })
}

fn row_to_city(row: &rusqlite::Row) -> rusqlite::Result<City> {
    Ok(City {
        id: row.get(0)?,
        name: row.get(1)?,
        state: row.get(2)?,
        country: row.get(3)?,
        lat: row.get(4)?,
        lon: row.get(5)?,
    })
}
