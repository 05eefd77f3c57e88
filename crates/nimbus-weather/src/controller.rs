//! Single-flight sequencing of forecast requests.
//!
//! Only the newest request runs: starting a request cancels the one in
//! flight, including its debounce wait, and events of a cancelled request
//! never reach the published state.
//!
//! The refresh clock in the settings (`last_updated_ms`) belongs to the
//! saved selection: only fresh forecasts of the selected city or device
//! location advance it, and changing the selection resets it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nimbus_core::{Coordinates, Settings, SettingsStore};

use crate::client::WeatherApi;
use crate::error::{FailureKind, ForecastError};
use crate::info::WeatherInfo;
use crate::records::{GPS_CITY_ID, NO_CITY_ID};
use crate::repository::{FetchEvent, FetchPolicy, FetchTarget, WeatherRepository, WeatherRequest};
use crate::timeline::now_ms;

/// Snapshot published to observers after every step of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub info: Option<WeatherInfo>,
    pub is_loading: bool,
    /// Whether `info` came from the local cache rather than a fresh fetch.
    pub cached: bool,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

pub struct WeatherController<A: WeatherApi + 'static> {
    repository: Arc<WeatherRepository<A>>,
    settings: Arc<dyn SettingsStore>,
    state: Arc<watch::Sender<WeatherState>>,
    in_flight: Mutex<Option<CancellationToken>>,
    debounce: Duration,
}

impl<A: WeatherApi + 'static> WeatherController<A> {
    pub fn new(
        repository: Arc<WeatherRepository<A>>,
        settings: Arc<dyn SettingsStore>,
        debounce: Duration,
    ) -> Self {
        let (state, _) = watch::channel(WeatherState::default());
        Self {
            repository,
            settings,
            state: Arc::new(state),
            in_flight: Mutex::new(None),
            debounce,
        }
    }

    pub fn repository(&self) -> &Arc<WeatherRepository<A>> {
        &self.repository
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        self.state.borrow().clone()
    }

    /// Cancel the request in flight, if any. The published state keeps its
    /// forecast and stops loading.
    pub fn cancel(&self) {
        if let Some(token) = self.in_flight.lock().take() {
            token.cancel();
            self.state.send_if_modified(|s| std::mem::replace(&mut s.is_loading, false));
            tracing::debug!("Weather request cancelled");
        }
    }

    /// Whether `target` is what the saved settings point at.
    fn is_selection(&self, target: &FetchTarget) -> bool {
        match self.settings.load() {
            Ok(settings) => target.city_id() == selected_city_id(&settings),
            Err(e) => {
                tracing::warn!("Failed to read settings: {}", e);
                false
            }
        }
    }

    /// Start `request` after `delay`, replacing any request in flight.
    pub fn request(
        &self,
        request: WeatherRequest,
        policy: FetchPolicy,
        delay: Duration,
    ) -> JoinHandle<()> {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.lock().replace(token.clone()) {
            previous.cancel();
        }

        let tracks_selection = self.is_selection(&request.target);
        let repository = self.repository.clone();
        let settings = self.settings.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Weather request superseded before it started");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let now = now_ms();
            let mut on_event = |event: FetchEvent| {
                if token.is_cancelled() {
                    return;
                }
                if tracks_selection && matches!(event, FetchEvent::Success { cached: false, .. }) {
                    if let Err(e) = settings.update(&mut |s| s.last_updated_ms = now) {
                        tracing::warn!("Failed to record refresh time: {}", e);
                    }
                }
                // cancel() may run between the check above and here
                state.send_if_modified(|s| {
                    if token.is_cancelled() {
                        return false;
                    }
                    apply_event(s, event);
                    true
                });
            };

            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Weather request superseded while loading");
                }
                _ = repository.load(&request, policy, now, &mut on_event) => {}
            }
        })
    }

    /// The request the saved settings point at: the device location when
    /// enabled and known, otherwise the selected city.
    pub fn selected_request(&self, now_ms: i64) -> Result<(WeatherRequest, FetchPolicy), ForecastError> {
        let settings = self.settings.load()?;

        let request = match settings.location_target() {
            Some(Coordinates { lat, lon }) => {
                WeatherRequest::for_coordinates(lat, lon, settings.language)
            }
            None => {
                let city = self
                    .repository
                    .city_by_id(settings.selected_city_id)?
                    .ok_or(ForecastError::CityNotFound(NO_CITY_ID))?;
                WeatherRequest::for_city(city, settings.language)
            }
        };

        let policy = if settings.is_refresh_due(now_ms) {
            FetchPolicy::Refresh
        } else {
            FetchPolicy::PreferCache
        };
        Ok((request, policy))
    }

    /// Load the forecast for the saved selection right away.
    pub fn request_selected(&self, now_ms: i64) -> Result<JoinHandle<()>, ForecastError> {
        let (request, policy) = self.selected_request(now_ms)?;
        Ok(self.request(request, policy, Duration::ZERO))
    }

    fn reload_selected(&self) -> Result<JoinHandle<()>, ForecastError> {
        let (request, policy) = self.selected_request(now_ms())?;
        Ok(self.request(request, policy, self.debounce))
    }

    /// Persist `city_id` as the selected city and reload after the debounce.
    pub fn select_city(&self, city_id: i32) -> Result<JoinHandle<()>, ForecastError> {
        if self.repository.city_by_id(city_id)?.is_none() {
            return Err(ForecastError::CityNotFound(city_id));
        }
        self.settings.update(&mut |s| {
            change_selection(s, |s| {
                s.selected_city_id = city_id;
                s.use_current_location = false;
            })
        })?;
        self.reload_selected()
    }

    pub fn set_use_current_location(&self, enabled: bool) -> Result<JoinHandle<()>, ForecastError> {
        self.settings
            .update(&mut |s| change_selection(s, |s| s.use_current_location = enabled))?;
        self.reload_selected()
    }

    /// Store the latest device position. Only reloads when location mode is on.
    pub fn set_current_location(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<JoinHandle<()>>, ForecastError> {
        let coordinates = Coordinates { lat, lon };
        if !coordinates.is_valid() {
            return Err(ForecastError::LocationNotFound(format!("{lat}, {lon}")));
        }
        let settings = self.settings.update(&mut |s| {
            if s.use_current_location && s.current_location != Some(coordinates) {
                s.last_updated_ms = 0;
            }
            s.current_location = Some(coordinates);
        })?;
        if settings.use_current_location {
            self.reload_selected().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// City id the saved settings resolve to; the GPS id in location mode.
fn selected_city_id(settings: &Settings) -> i32 {
    match settings.location_target() {
        Some(_) => GPS_CITY_ID,
        None => settings.selected_city_id,
    }
}

/// Apply `change` and restart the refresh clock if the selection moved.
fn change_selection(settings: &mut Settings, change: impl FnOnce(&mut Settings)) {
    let before = selected_city_id(settings);
    change(settings);
    if selected_city_id(settings) != before {
        settings.last_updated_ms = 0;
    }
}

fn apply_event(state: &mut WeatherState, event: FetchEvent) {
    match event {
        FetchEvent::Loading(info) => {
            state.is_loading = true;
            if let Some(info) = info {
                state.info = Some(info);
                state.cached = true;
            }
        }
        FetchEvent::Success { info, cached } => {
            state.info = Some(info);
            state.cached = cached;
            state.is_loading = false;
            state.error = None;
            state.failure = None;
        }
        FetchEvent::Failed { error, info } => {
            if let Some(info) = info {
                state.info = Some(info);
                state.cached = true;
            }
            state.is_loading = false;
            state.error = Some(error.user_message());
            state.failure = Some(error.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::records::GPS_CITY_ID;
    use crate::testing::{seeded_cache, sofia, sofiya_oblast, FakeApi};
    use nimbus_core::{Language, MemorySettingsStore, Settings};

    fn controller(api: FakeApi, settings: Settings) -> WeatherController<FakeApi> {
        WeatherController::new(
            Arc::new(WeatherRepository::new(api, seeded_cache())),
            Arc::new(MemorySettingsStore::new(settings)),
            Duration::from_millis(50),
        )
    }

    fn sofia_settings() -> Settings {
        Settings {
            selected_city_id: sofia().id,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_request_publishes_fresh_forecast() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        let request = WeatherRequest::for_city(sofia(), Language::English);

        controller
            .request(request, FetchPolicy::PreferCache, Duration::ZERO)
            .await
            .unwrap();

        let state = controller.state();
        assert!(!state.is_loading);
        assert!(!state.cached);
        assert!(state.error.is_none());
        assert_eq!(state.info.unwrap().city_name, "Sofia");
        assert!(controller.settings.load().unwrap().last_updated_ms > 0);
    }

    #[tokio::test]
    async fn test_newer_request_cancels_older() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        let request = WeatherRequest::for_city(sofia(), Language::English);

        let first = controller.request(
            request.clone(),
            FetchPolicy::Refresh,
            Duration::from_millis(200),
        );
        let second = controller.request(request, FetchPolicy::Refresh, Duration::from_millis(10));
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(controller.repository().api().calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_drops_pending_request() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        let request = WeatherRequest::for_city(sofia(), Language::English);

        let handle = controller.request(request, FetchPolicy::Refresh, Duration::from_millis(200));
        controller.cancel();
        handle.await.unwrap();

        assert_eq!(controller.repository().api().calls(), 0);
        assert_eq!(controller.state(), WeatherState::default());
    }

    #[tokio::test]
    async fn test_failure_keeps_cached_forecast() {
        let cache = seeded_cache();
        let seeded = WeatherRepository::new(FakeApi::ok(), cache);
        let request = WeatherRequest::for_city(sofia(), Language::English);
        seeded
            .load_latest(&request, FetchPolicy::Refresh, now_ms())
            .await;

        let repository = Arc::new(WeatherRepository::with_shared_cache(
            FakeApi::failing(),
            seeded.cache(),
        ));
        let controller = WeatherController::new(
            repository,
            Arc::new(MemorySettingsStore::new(sofia_settings())),
            Duration::ZERO,
        );

        controller
            .request(request, FetchPolicy::Refresh, Duration::ZERO)
            .await
            .unwrap();

        let state = controller.state();
        assert!(state.cached);
        assert!(state.info.is_some());
        assert_eq!(state.failure, Some(FailureKind::Http));
        assert!(state.error.unwrap().starts_with("Oops"));
        assert_eq!(controller.settings.load().unwrap().last_updated_ms, 0);
    }

    #[tokio::test]
    async fn test_request_selected_prefers_location() {
        let settings = Settings {
            use_current_location: true,
            current_location: Some(Coordinates {
                lat: 42.7,
                lon: 23.3,
            }),
            ..Settings::default()
        };
        let controller = controller(FakeApi::ok(), settings);

        controller.request_selected(now_ms()).unwrap().await.unwrap();

        let cached = controller
            .repository()
            .cache()
            .lock()
            .load_forecast(GPS_CITY_ID)
            .unwrap();
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn test_selected_request_policy() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        let now = now_ms();

        let (request, policy) = controller.selected_request(now).unwrap();
        assert_eq!(request.target.city_id(), sofia().id);
        assert_eq!(policy, FetchPolicy::Refresh);

        controller
            .settings
            .update(&mut |s| s.last_updated_ms = now)
            .unwrap();
        let (_, policy) = controller.selected_request(now).unwrap();
        assert_eq!(policy, FetchPolicy::PreferCache);
    }

    #[tokio::test]
    async fn test_other_city_keeps_selection_refresh_due() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        let other = WeatherRequest::for_city(sofiya_oblast(), Language::English);

        controller
            .request(other, FetchPolicy::Refresh, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(controller.state().info.unwrap().city_name, "Sofiya Oblast");
        assert_eq!(controller.settings.load().unwrap().last_updated_ms, 0);

        let (request, policy) = controller.selected_request(now_ms()).unwrap();
        assert_eq!(request.target.city_id(), sofia().id);
        assert_eq!(policy, FetchPolicy::Refresh);
    }

    #[tokio::test]
    async fn test_changing_selection_restarts_refresh_clock() {
        let controller = controller(FakeApi::ok(), sofia_settings());
        controller
            .settings
            .update(&mut |s| s.last_updated_ms = now_ms())
            .unwrap();

        controller.select_city(sofia().id).unwrap().await.unwrap();
        assert!(controller.settings.load().unwrap().last_updated_ms > 0);

        controller.cancel();
        controller.select_city(sofiya_oblast().id).unwrap();
        controller.cancel();
        assert_eq!(controller.settings.load().unwrap().last_updated_ms, 0);
    }

    #[tokio::test]
    async fn test_cancel_while_loading_clears_loading_flag() {
        let controller = controller(
            FakeApi::slow(Duration::from_secs(30)),
            sofia_settings(),
        );
        let mut updates = controller.subscribe();
        let request = WeatherRequest::for_city(sofia(), Language::English);

        let handle = controller.request(request, FetchPolicy::Refresh, Duration::ZERO);
        updates.wait_for(|s| s.is_loading).await.unwrap();

        controller.cancel();
        handle.await.unwrap();

        let state = controller.state();
        assert!(!state.is_loading);
        assert!(state.info.is_none());
        assert_eq!(controller.repository().api().calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_selected_city() {
        let controller = controller(FakeApi::ok(), Settings::default());

        assert!(matches!(
            controller.request_selected(now_ms()),
            Err(ForecastError::CityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_select_city_persists_and_reloads() {
        let settings = Settings {
            use_current_location: true,
            ..Settings::default()
        };
        let controller = controller(FakeApi::ok(), settings);

        controller.select_city(sofia().id).unwrap().await.unwrap();

        let saved = controller.settings.load().unwrap();
        assert_eq!(saved.selected_city_id, sofia().id);
        assert!(!saved.use_current_location);
        assert_eq!(controller.state().info.unwrap().city_name, "Sofia");

        assert!(matches!(
            controller.select_city(1),
            Err(ForecastError::CityNotFound(1))
        ));
    }

    #[tokio::test]
    async fn test_set_current_location() {
        let controller = controller(FakeApi::ok(), sofia_settings());

        assert!(controller.set_current_location(42.7, 23.3).unwrap().is_none());
        assert!(controller.set_current_location(120.0, 0.0).is_err());

        let handle = controller.set_use_current_location(true).unwrap();
        handle.await.unwrap();
        assert_eq!(
            controller.state().info.unwrap().city_name,
            crate::records::GPS_CITY_NAME
        );
    }
}
