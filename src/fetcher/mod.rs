//! Source of instantaneous weather readings.
//!
//! The sampling loop only depends on [`ReadingFetcher`]; any transport or
//! decoding problem surfaces as a [`FetchError`] and is handled as a skipped
//! city for the current cycle.

mod openweather;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openweather::OpenWeatherFetcher;

/// One instantaneous reading for a city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: f64,
    pub condition: String,
    /// Unix seconds reported by the source.
    pub source_timestamp: i64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch timed out after {0}s")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Payload(String),
}

pub trait ReadingFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<WeatherReading, FetchError>> + Send;
}
