use std::time::Duration;

use chrono::Utc;
use nearby_core::{Coordinates, TemperatureUnit, WeatherConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{CurrentWeather, WeatherCondition, WeatherError, WeatherSnapshot};

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

impl From<CurrentBlock> for CurrentWeather {
    fn from(block: CurrentBlock) -> Self {
        Self {
            temperature: block.temperature_2m,
            feels_like: block.apparent_temperature,
            humidity: block.relative_humidity_2m.clamp(0.0, 100.0).round() as u8,
            wind_speed: block.wind_speed_10m,
            condition: WeatherCondition::from_wmo_code(block.weather_code),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    unit: TemperatureUnit,
}

impl WeatherProvider {
    pub fn new(config: &WeatherConfig, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            unit: config.temperature_unit,
        })
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Fetch current conditions at `lat`/`lng`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, lat: f64, lng: f64) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);

        let mut query = vec![
            ("latitude", lat.to_string()),
            ("longitude", lng.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
        ];
        if self.unit == TemperatureUnit::Fahrenheit {
            query.push(("temperature_unit", "fahrenheit".to_string()));
            query.push(("wind_speed_unit", "mph".to_string()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let current = CurrentWeather::from(parsed.current);
        tracing::debug!(
            "Weather at {}, {}: {} ({:.1})",
            lat,
            lng,
            current.condition.description(),
            current.temperature
        );

        Ok(WeatherSnapshot {
            coordinates: Coordinates::new(lat, lng),
            current,
            fetched_at: Utc::now(),
        })
    }
}
