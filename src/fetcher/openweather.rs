use std::time::Duration;

use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{FetchError, ReadingFetcher, WeatherReading};

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    weather: Vec<ConditionPayload>,
    main: MainPayload,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct ConditionPayload {
    main: String,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: f64,
}

/// Fetches current conditions from an OpenWeatherMap-compatible endpoint in
/// metric units.
#[derive(Clone)]
pub struct OpenWeatherFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherFetcher {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn parse_payload(body: &[u8]) -> Result<WeatherReading, FetchError> {
    let payload: WeatherPayload =
        serde_json::from_slice(body).map_err(|err| FetchError::Payload(err.to_string()))?;

    let condition = payload
        .weather
        .into_iter()
        .next()
        .map(|c| c.main)
        .ok_or_else(|| FetchError::Payload("empty weather array".into()))?;

    if !payload.main.temp.is_finite() {
        return Err(FetchError::Payload(format!(
            "non-finite temperature {}",
            payload.main.temp
        )));
    }

    Ok(WeatherReading {
        temperature: payload.main.temp,
        condition,
        source_timestamp: payload.dt,
    })
}

impl ReadingFetcher for OpenWeatherFetcher {
    async fn fetch(&self, city: &str) -> Result<WeatherReading, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("APPID", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        debug!("weather payload for {city}: {} bytes", body.len());

        parse_payload(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_condition_and_metric_temperature() {
        let body = br#"{
            "weather": [{"main": "Clouds"}, {"main": "Mist"}],
            "main": {"temp": 24.6, "feels_like": 25.1},
            "dt": 1714557600
        }"#;

        let reading = parse_payload(body).unwrap();
        assert_eq!(
            reading,
            WeatherReading {
                temperature: 24.6,
                condition: "Clouds".into(),
                source_timestamp: 1_714_557_600,
            }
        );
    }

    #[test]
    fn empty_weather_array_is_a_payload_error() {
        let body = br#"{"weather": [], "main": {"temp": 20.0}, "dt": 1}"#;
        assert!(matches!(parse_payload(body), Err(FetchError::Payload(_))));
    }

    #[test]
    fn garbage_is_a_payload_error() {
        assert!(matches!(
            parse_payload(b"<html>rate limited</html>"),
            Err(FetchError::Payload(_))
        ));
    }
}
