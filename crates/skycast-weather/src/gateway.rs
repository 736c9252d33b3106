//! Fetch gateway: adapts the provider client into a two-outcome contract.
//!
//! Every transport or provider failure collapses into a single
//! `LookupFailed` error so the search layer never depends on provider
//! error shapes. Cause detail is logged here and nowhere else.

use std::sync::Arc;

use thiserror::Error;

use crate::client::ClientError;
use crate::types::CurrentConditions;

/// Uniform error surface for a city weather lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Could not fetch weather for \"{city}\"")]
    LookupFailed { city: String },
}

/// One outbound weather lookup per call.
///
/// Implemented by `OpenWeatherClient`; test code substitutes doubles.
#[async_trait::async_trait]
pub trait CityLookup: Send + Sync {
    async fn lookup(&self, city: &str) -> Result<CurrentConditions, ClientError>;
}

#[async_trait::async_trait]
impl<T: CityLookup + ?Sized> CityLookup for Arc<T> {
    async fn lookup(&self, city: &str) -> Result<CurrentConditions, ClientError> {
        (**self).lookup(city).await
    }
}

/// Wraps a `CityLookup` and normalizes its failures.
///
/// No retry logic lives here: retries are user-initiated at the
/// orchestrator level.
#[derive(Debug)]
pub struct FetchGateway<C> {
    lookup: C,
}

impl<C: CityLookup> FetchGateway<C> {
    pub fn new(lookup: C) -> Self {
        Self { lookup }
    }

    /// Fetch current weather for a city. Resolves exactly once, to either
    /// the payload or `FetchError::LookupFailed`.
    pub async fn fetch(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        match self.lookup.lookup(city).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::warn!(city, error = %e, "weather lookup failed");
                Err(FetchError::LookupFailed {
                    city: city.to_string(),
                })
            }
        }
    }
}
