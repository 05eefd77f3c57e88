//! End-to-end: HTTP client, on-disk cache and repository together.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use nimbus_core::{ApiConfig, Language};
use nimbus_weather::timeline::{now_ms, MILLIS_PER_HOUR};
use nimbus_weather::{
    City, FailureKind, FetchEvent, FetchPolicy, OpenWeatherClient, WeatherCache,
    WeatherRepository, WeatherRequest,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sofia() -> City {
    City {
        id: 727_011,
        name: "Sofia".into(),
        state: None,
        country: "BG".into(),
        lat: 42.69751,
        lon: 23.32415,
    }
}

fn client(base_url: &str) -> OpenWeatherClient {
    OpenWeatherClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        api_key: Some("test_key".to_string()),
        timeout_secs: 2,
        max_retries: 0,
    })
    .unwrap()
}

fn forecast_body(now_ms: i64) -> serde_json::Value {
    let now = now_ms / 1000;
    let hour = MILLIS_PER_HOUR / 1000;
    let hourly: Vec<_> = (0..48)
        .map(|i| {
            serde_json::json!({
                "dt": now - now % hour + i * hour,
                "temp": 5.0 + i as f64 / 10.0,
                "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]
            })
        })
        .collect();
    let daily: Vec<_> = (0..8)
        .map(|i| {
            let day = now + i * 24 * hour;
            serde_json::json!({
                "dt": day,
                "sunrise": day - 5 * hour,
                "sunset": day + 5 * hour,
                "moon_phase": 0.5,
                "temp": {"min": 1.0 + i as f64, "max": 10.0 + i as f64, "day": 8.0},
                "feels_like": {"day": 6.5},
                "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
            })
        })
        .collect();

    serde_json::json!({
        "lat": 42.6975,
        "lon": 23.3242,
        "timezone": "Europe/Sofia",
        "timezone_offset": 7200,
        "current": {
            "dt": now,
            "sunrise": now - 5 * hour,
            "sunset": now + 5 * hour,
            "temp": 7.4,
            "feels_like": 5.1,
            "humidity": 71,
            "wind_speed": 3.6,
            "wind_deg": 250,
            "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]
        },
        "hourly": hourly,
        "daily": daily
    })
}

#[tokio::test]
async fn fresh_fetch_then_fallback_to_disk_cache() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("weather.db");
    let now = now_ms();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .and(query_param("appid", "test_key"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(now)))
        .expect(1)
        .mount(&server)
        .await;

    let request = WeatherRequest::for_city(sofia(), Language::English);

    // Online: the first load goes to the network and fills the cache.
    {
        let repository =
            WeatherRepository::new(client(&server.uri()), WeatherCache::new(&db_path).unwrap());
        match repository
            .load_latest(&request, FetchPolicy::PreferCache, now)
            .await
        {
            FetchEvent::Success { info, cached } => {
                assert!(!cached);
                assert_eq!(info.city_name, "Sofia");
                assert_eq!(info.current.temperature, Some(7.4));
                assert_eq!(info.current.title, "Rain");
                assert!(info.next_hours.iter().all(|h| h.time_ms.is_some()));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    // Offline: a refresh fails but the cached forecast is still reported.
    let offline = WeatherRepository::new(
        client("http://127.0.0.1:9"),
        WeatherCache::new(&db_path).unwrap(),
    );
    match offline
        .load_latest(&request, FetchPolicy::Refresh, now)
        .await
    {
        FetchEvent::Failed { error, info } => {
            assert_eq!(error.kind(), FailureKind::Unreachable);
            let info = info.expect("cached forecast");
            assert_eq!(info.current.temperature, Some(7.4));
            assert_eq!(info.comfort.feels_like, Some(5.1));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Without a forced refresh the cache answers on its own.
    match offline
        .load_latest(&request, FetchPolicy::PreferCache, now)
        .await
    {
        FetchEvent::Success { info, cached } => {
            assert!(cached);
            assert_eq!(info.wind.speed, Some(3.6));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_cache_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let repository = WeatherRepository::new(
        client(&server.uri()),
        WeatherCache::new(dir.path().join("weather.db")).unwrap(),
    );
    let request = WeatherRequest::for_city(sofia(), Language::English);

    match repository
        .load_latest(&request, FetchPolicy::PreferCache, now_ms())
        .await
    {
        FetchEvent::Failed { error, info } => {
            assert_eq!(error.kind(), FailureKind::Http);
            assert!(info.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(repository.cached_forecasts().unwrap().is_empty());
}
