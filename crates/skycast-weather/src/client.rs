//! OpenWeather current-weather API client.

use std::time::Duration;

use skycast_core::config::Units;
use skycast_core::error::{NetworkError, ReqwestErrorExt};
use thiserror::Error;

use crate::gateway::CityLookup;
use crate::types::CurrentConditions;

const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org";

/// Errors reported by the weather provider client.
///
/// These carry enough detail for logging; the fetch gateway collapses them
/// before they reach the search layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Client for the OpenWeather current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    units: Units,
    base_url: String,
}

impl OpenWeatherClient {
    /// Create a client with the given API key and units.
    pub fn new(api_key: &str, units: Units, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            units,
            base_url: OPENWEATHER_API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub fn new_with_base_url(
        api_key: &str,
        units: Units,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let mut client = Self::new(api_key, units, Duration::from_secs(10))?;
        client.base_url = base_url.to_string();
        Ok(client)
    }

    async fn get_current(&self, city: &str) -> Result<CurrentConditions, ClientError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", &self.api_key),
                ("units", self.units.as_query_param()),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.into_network_error()))?;

        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()))
        } else if status.as_u16() == 404 {
            Err(ClientError::CityNotFound(city.to_string()))
        } else if status.as_u16() == 401 {
            Err(ClientError::InvalidApiKey)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait::async_trait]
impl CityLookup for OpenWeatherClient {
    async fn lookup(&self, city: &str) -> Result<CurrentConditions, ClientError> {
        tracing::debug!(city, "looking up current weather");
        self.get_current(city).await
    }
}
