//! OpenWeatherMap One Call client.

use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

use nimbus_core::{ApiConfig, Language};

use crate::dto::OneCallResponse;
use crate::error::ForecastError;
use crate::retry::{with_retry, RetryConfig};

const ONE_CALL_PATH: &str = "/data/2.5/onecall";
const EXCLUDED_PARTS: &str = "minutely,alerts";
/// Data is always requested in metric units and converted for display.
const UNITS: &str = "metric";

/// What to ask the API for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneCallQuery {
    pub lat: f64,
    pub lon: f64,
    pub language: Language,
}

/// Source of forecast data.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn one_call(&self, query: &OneCallQuery) -> Result<OneCallResponse, ForecastError>;
}

pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryConfig,
}

impl OpenWeatherClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig {
                max_retries: config.max_retries,
                ..RetryConfig::default()
            },
        })
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    pub fn new_with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key.to_string()),
            base_url: base_url.to_string(),
            retry: RetryConfig::none(),
        }
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ForecastError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ForecastError::Parse(format!("JSON parse error: {}", e)))
        } else if status.as_u16() == 401 {
            Err(ForecastError::InvalidApiKey)
        } else if status.as_u16() == 404 {
            let text = response.text().await.unwrap_or_default();
            Err(ForecastError::LocationNotFound(text))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(ForecastError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ForecastError::Api(format!("{}: {}", status, text)))
        }
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn one_call(&self, query: &OneCallQuery) -> Result<OneCallResponse, ForecastError> {
        let api_key = self.api_key.as_deref().ok_or(ForecastError::MissingApiKey)?;
        let url = format!("{}{}", self.base_url, ONE_CALL_PATH);
        let lat = query.lat.to_string();
        let lon = query.lon.to_string();
        let params = [
            ("appid", api_key),
            ("exclude", EXCLUDED_PARTS),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("lang", query.language.api_code()),
            ("units", UNITS),
        ];

        let response = with_retry(&self.retry, || self.client.get(&url).query(&params).send()).await?;

        let parsed: OneCallResponse = self.handle_response(response).await?;
        tracing::debug!(
            daily = parsed.daily.len(),
            hourly = parsed.hourly.len(),
            "One Call response received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query() -> OneCallQuery {
        OneCallQuery {
            lat: 42.69751,
            lon: 23.32415,
            language: Language::Bulgarian,
        }
    }

    #[tokio::test]
    async fn test_one_call_sends_expected_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .and(query_param("appid", "test_key"))
            .and(query_param("exclude", "minutely,alerts"))
            .and(query_param("lat", "42.69751"))
            .and(query_param("lon", "23.32415"))
            .and(query_param("lang", "bg"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lat": 42.6975,
                "lon": 23.3242,
                "timezone": "Europe/Sofia",
                "timezone_offset": 10800,
                "current": {"dt": 1650000000, "temp": 18.2, "weather": []},
                "daily": [{"dt": 1650000000}],
                "hourly": []
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new_with_base_url("test_key", &mock_server.uri());
        let response = client.one_call(&query()).await.unwrap();

        assert_eq!(response.timezone_offset, Some(10800));
        assert_eq!(response.daily.len(), 1);
        assert_eq!(response.current.unwrap().temp, Some(18.2));
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new_with_base_url("bad", &mock_server.uri());
        let result = client.one_call(&query()).await;

        assert!(matches!(result, Err(ForecastError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/onecall"))
            .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "30"))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new_with_base_url("key", &mock_server.uri());
        let result = client.one_call(&query()).await;

        assert!(matches!(result, Err(ForecastError::RateLimited(30))));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new_with_base_url("key", &mock_server.uri());
        match client.one_call(&query()).await {
            Err(ForecastError::Api(msg)) => assert!(msg.contains("boom")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = OpenWeatherClient::new_with_base_url("key", &mock_server.uri());
        let result = client.one_call(&query()).await;

        assert!(matches!(result, Err(ForecastError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_key_never_hits_network() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: None,
            timeout_secs: 1,
            max_retries: 0,
        };
        let client = OpenWeatherClient::new(&config).unwrap();
        let result = client.one_call(&query()).await;

        assert!(matches!(result, Err(ForecastError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("key".to_string()),
            timeout_secs: 2,
            max_retries: 0,
        };
        let client = OpenWeatherClient::new(&config).unwrap();
        let result = client.one_call(&query()).await;

        assert!(matches!(result, Err(ForecastError::Network(_))));
    }
}
