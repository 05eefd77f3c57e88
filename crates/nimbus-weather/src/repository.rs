//! Cache-and-merge access to forecasts.
//!
//! A request reports its progress through [`FetchEvent`]s: loading (with
//! whatever the cache already holds), then success or failure. A failed
//! refresh still carries the cached forecast so callers can keep showing
//! it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use nimbus_core::Language;

use crate::cache::WeatherCache;
use crate::cities::import_city_list;
use crate::client::{OneCallQuery, WeatherApi};
use crate::error::ForecastError;
use crate::info::WeatherInfo;
use crate::records::{City, ResponseRecord, GPS_CITY_ID, GPS_CITY_NAME, NO_CITY_ID};
use crate::summary::summarize;

/// Where a forecast is for.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    City(City),
    /// Cached under the reserved GPS city id.
    Coordinates { lat: f64, lon: f64 },
}

impl FetchTarget {
    pub fn city_id(&self) -> i32 {
        match self {
            Self::City(city) => city.id,
            Self::Coordinates { .. } => GPS_CITY_ID,
        }
    }

    pub fn city_name(&self) -> &str {
        match self {
            Self::City(city) => &city.name,
            Self::Coordinates { .. } => GPS_CITY_NAME,
        }
    }

    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Self::City(city) => (city.lat, city.lon),
            Self::Coordinates { lat, lon } => (*lat, *lon),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub target: FetchTarget,
    pub language: Language,
}

impl WeatherRequest {
    pub fn for_city(city: City, language: Language) -> Self {
        Self {
            target: FetchTarget::City(city),
            language,
        }
    }

    pub fn for_coordinates(lat: f64, lon: f64, language: Language) -> Self {
        Self {
            target: FetchTarget::Coordinates { lat, lon },
            language,
        }
    }

    fn query(&self) -> OneCallQuery {
        let (lat, lon) = self.target.coordinates();
        OneCallQuery {
            lat,
            lon,
            language: self.language,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Use the cached forecast when there is one.
    #[default]
    PreferCache,
    /// Always call the API, keeping the cache as fallback.
    Refresh,
}

#[derive(Debug)]
pub enum FetchEvent {
    Loading(Option<WeatherInfo>),
    Success {
        info: WeatherInfo,
        cached: bool,
    },
    Failed {
        error: ForecastError,
        info: Option<WeatherInfo>,
    },
}

impl FetchEvent {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Loading(_))
    }
}

pub struct WeatherRepository<A: WeatherApi> {
    api: A,
    cache: Arc<Mutex<WeatherCache>>,
}

impl<A: WeatherApi> WeatherRepository<A> {
    pub fn new(api: A, cache: WeatherCache) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Share an already opened cache between repositories.
    pub fn with_shared_cache(api: A, cache: Arc<Mutex<WeatherCache>>) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> Arc<Mutex<WeatherCache>> {
        self.cache.clone()
    }

    fn cached_info(&self, city_id: i32, now_ms: i64) -> Option<WeatherInfo> {
        let bundle = match self.cache.lock().load_forecast(city_id) {
            Ok(bundle) => bundle?,
            Err(e) => {
                tracing::warn!("Failed to read cached forecast for {}: {}", city_id, e);
                return None;
            }
        };
        Some(summarize(&bundle, now_ms))
    }

    /// Load the forecast for `request`, reporting each step to `on_event`.
    /// The last event is always `Success` or `Failed`.
    pub async fn load(
        &self,
        request: &WeatherRequest,
        policy: FetchPolicy,
        now_ms: i64,
        on_event: &mut (dyn FnMut(FetchEvent) + Send),
    ) {
        on_event(FetchEvent::Loading(None));

        let city_id = request.target.city_id();
        let cached = self.cached_info(city_id, now_ms);

        if policy == FetchPolicy::PreferCache {
            if let Some(info) = cached {
                tracing::debug!("Serving forecast for {} from cache", city_id);
                on_event(FetchEvent::Success { info, cached: true });
                return;
            }
        }

        on_event(FetchEvent::Loading(cached.clone()));

        let response = match self.api.one_call(&request.query()).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("Forecast refresh for {} failed: {}", city_id, error);
                on_event(FetchEvent::Failed {
                    error,
                    info: cached,
                });
                return;
            }
        };

        let bundle = response.into_bundle(city_id, request.target.city_name(), now_ms);
        if let Err(e) = self.cache.lock().replace_forecast(&bundle) {
            tracing::error!("Failed to cache forecast for {}: {}", city_id, e);
        }

        tracing::info!(
            city_id,
            daily = bundle.daily.len(),
            hourly = bundle.hourly.len(),
            "Forecast refreshed"
        );
        on_event(FetchEvent::Success {
            info: summarize(&bundle, now_ms),
            cached: false,
        });
    }

    /// Like [`load`](Self::load) but only returns the final event.
    pub async fn load_latest(
        &self,
        request: &WeatherRequest,
        policy: FetchPolicy,
        now_ms: i64,
    ) -> FetchEvent {
        let mut last = None;
        self.load(request, policy, now_ms, &mut |event| last = Some(event))
            .await;
        last.unwrap_or_else(|| FetchEvent::Failed {
            error: ForecastError::NoRecordsFound,
            info: None,
        })
    }

    /// Cities whose name starts with `name`, case-insensitively.
    pub fn search_cities(&self, name: &str) -> Result<Vec<City>, ForecastError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        let cities = self
            .cache
            .lock()
            .search_cities(name)
            .map_err(|e| ForecastError::Cache(e.to_string()))?;
        if cities.is_empty() {
            return Err(ForecastError::NoRecordsFound);
        }
        Ok(cities)
    }

    /// `None` for the "no city" sentinel.
    pub fn city_by_id(&self, id: i32) -> Result<Option<City>, ForecastError> {
        if id == NO_CITY_ID {
            return Ok(None);
        }
        self.cache
            .lock()
            .city_by_id(id)
            .map_err(|e| ForecastError::Cache(e.to_string()))?
            .map(Some)
            .ok_or(ForecastError::CityNotFound(id))
    }

    pub fn import_cities(&self, path: &Path) -> Result<usize, ForecastError> {
        import_city_list(&mut self.cache.lock(), path)
            .map_err(|e| ForecastError::Cache(e.to_string()))
    }

    pub fn cached_forecasts(&self) -> Result<Vec<ResponseRecord>, ForecastError> {
        self.cache
            .lock()
            .cached_forecasts()
            .map_err(|e| ForecastError::Cache(e.to_string()))
    }

    pub fn clear_cache(&self) -> Result<(), ForecastError> {
        self.cache
            .lock()
            .clear()
            .map_err(|e| ForecastError::Cache(e.to_string()))
    }
}
