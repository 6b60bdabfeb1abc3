use std::{collections::HashSet, fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const API_KEY_ENV: &str = "WEATHER_MONITOR_API_KEY";

const DEFAULT_CITIES: [&str; 6] = ["Mumbai", "Delhi", "Bangalore", "Hyderabad", "Chennai", "Kolkata"];

/// Everything the monitor needs at startup. Passed by value into the
/// scheduler; nothing here is read from globals once the service is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampled in this order every cycle.
    pub cities: Vec<String>,
    pub api_key: String,
    pub api_base_url: String,
    pub database_path: PathBuf,
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Readings strictly above this raise the alert flag.
    pub alert_threshold: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            api_key: String::new(),
            api_base_url: "https://api.openweathermap.org/data/2.5/weather".into(),
            database_path: PathBuf::from("weather_monitoring.sqlite3"),
            poll_interval_secs: 30,
            fetch_timeout_secs: 10,
            alert_threshold: 28.0,
        }
    }
}

impl MonitorConfig {
    /// Reads `path` if it exists, falls back to defaults otherwise, then
    /// applies the API key environment override and validates.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            MonitorConfig::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            bail!("at least one city must be configured");
        }

        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.trim().is_empty() {
                bail!("city names must not be blank");
            }
            if !seen.insert(city.as_str()) {
                bail!("city '{city}' is configured more than once");
            }
        }

        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.fetch_timeout_secs == 0 {
            bail!("fetch_timeout_secs must be greater than zero");
        }
        if !self.alert_threshold.is_finite() {
            bail!("alert_threshold must be a finite number");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
