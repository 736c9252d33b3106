//! Weather lookup for Skycast
//!
//! Wraps the OpenWeather current-weather API behind a uniform fetch
//! gateway so callers see a single success/failure outcome per lookup.

pub mod client;
pub mod gateway;
pub mod types;

pub use client::{ClientError, OpenWeatherClient};
pub use gateway::{CityLookup, FetchError, FetchGateway};
pub use types::*;
