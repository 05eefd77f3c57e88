//! Test doubles shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::WeatherCache;
use crate::client::{OneCallQuery, WeatherApi};
use crate::dto::OneCallResponse;
use crate::error::ForecastError;
use crate::records::City;

/// Answers every call with [`sample_response`], or fails when built with
/// [`FakeApi::failing`].
pub struct FakeApi {
    calls: AtomicUsize,
    fail: bool,
    delay: Duration,
}

impl FakeApi {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    /// Answers like [`FakeApi::ok`] after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::ok()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherApi for FakeApi {
    async fn one_call(&self, _query: &OneCallQuery) -> Result<OneCallResponse, ForecastError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(ForecastError::Api("503: unavailable".into()));
        }
        Ok(sample_response())
    }
}

/// Sofia on 2022-02-19: one daily entry, one hourly entry, clear sky.
pub fn sample_response() -> OneCallResponse {
    serde_json::from_value(serde_json::json!({
        "lat": 42.6975,
        "lon": 23.3242,
        "timezone": "Europe/Sofia",
        "timezone_offset": 7200,
        "current": {
            "dt": 1645270000,
            "sunrise": 1645247000,
            "sunset": 1645286000,
            "temp": 8.3,
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}]
        },
        "daily": [{
            "dt": 1645264800,
            "sunrise": 1645247000,
            "sunset": 1645286000,
            "temp": {"min": 1.0, "max": 11.0, "day": 9.0},
            "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}]
        }],
        "hourly": [{"dt": 1645268400, "temp": 8.0}]
    }))
    .unwrap()
}

pub fn sofiya_oblast() -> City {
    City {
        id: 729_114,
        name: "Sofiya Oblast".into(),
        state: None,
        country: "BG".into(),
        lat: 42.67,
        lon: 23.5,
    }
}

pub fn sofia() -> City {
    City {
        id: 727_011,
        name: "Sofia".into(),
        state: None,
        country: "BG".into(),
        lat: 42.69751,
        lon: 23.32415,
    }
}

/// In-memory cache with Sofia and one other "Sof" city.
pub fn seeded_cache() -> WeatherCache {
    let mut cache = WeatherCache::in_memory().unwrap();
    cache
        .store_cities(&[sofia(), sofiya_oblast()])
        .unwrap();
    cache
}
