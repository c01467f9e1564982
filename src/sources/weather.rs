//! Weather source adapter (Open-Meteo)

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{FetchError, FetchResult};
use crate::fallback;
use crate::fetch::FetchGateway;
use crate::sources::SourceAdapter;
use crate::types::{ForecastDay, Snapshot, SourceId, SourcePayload, WeatherReport};

/// Days shown in the forecast strip
const FORECAST_DAYS: usize = 5;

/// Adapter for the weather panel
pub struct WeatherAdapter {
    gateway: Arc<dyn FetchGateway>,
    url: String,
}

impl WeatherAdapter {
    /// Create an adapter over the configured forecast endpoint
    pub fn new(gateway: Arc<dyn FetchGateway>, url: impl Into<String>) -> Self {
        Self {
            gateway,
            url: url.into(),
        }
    }

    async fn try_fetch(&self) -> FetchResult<WeatherReport> {
        let raw = self.gateway.get_json(&self.url).await?;
        let wire: WeatherWire =
            serde_json::from_value(raw).map_err(|e| FetchError::Decode(e.to_string()))?;

        let humidity_pct = wire
            .hourly
            .relativehumidity_2m
            .first()
            .copied()
            .ok_or_else(|| FetchError::Decode("Missing humidity series".to_string()))?;

        let forecast = wire
            .daily
            .time
            .iter()
            .zip(wire.daily.temperature_2m_max.iter())
            .zip(wire.daily.temperature_2m_min.iter())
            .take(FORECAST_DAYS)
            .map(|((date, high), low)| ForecastDay {
                label: weekday_label(date),
                high_c: *high,
                low_c: *low,
            })
            .collect();

        Ok(WeatherReport {
            temperature_c: wire.current_weather.temperature,
            wind_speed_kmh: wire.current_weather.windspeed,
            humidity_pct,
            condition_code: wire.current_weather.weathercode,
            forecast,
        })
    }
}

#[async_trait]
impl SourceAdapter for WeatherAdapter {
    fn source(&self) -> SourceId {
        SourceId::Weather
    }

    async fn fetch_snapshot(&self) -> Snapshot {
        match self.try_fetch().await {
            Ok(report) => Snapshot::live(SourceId::Weather, SourcePayload::Weather(report)),
            Err(e) => {
                tracing::warn!(source = %SourceId::Weather, error = %e, "Live fetch failed, substituting fallback data");
                Snapshot::fallback(
                    SourceId::Weather,
                    SourcePayload::Weather(fallback::weather_report()),
                )
            }
        }
    }
}

/// Short weekday label from an ISO date, or the raw string if unparsable
fn weekday_label(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Deserialize)]
struct WeatherWire {
    current_weather: CurrentWeatherWire,
    hourly: HourlyWire,
    daily: DailyWire,
}

#[derive(Deserialize)]
struct CurrentWeatherWire {
    temperature: f64,
    windspeed: f64,
    weathercode: u32,
}

#[derive(Deserialize)]
struct HourlyWire {
    relativehumidity_2m: Vec<f64>,
}

#[derive(Deserialize)]
struct DailyWire {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}
