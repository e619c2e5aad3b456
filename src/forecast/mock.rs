use super::types::*;
use crate::worker::network::{Network, NetworkError, Request, Response};
use async_trait::async_trait;
use chrono::{Duration, Local, Timelike};

const MOCK_CODES: [i32; 8] = [0, 1, 2, 3, 45, 61, 71, 95];

/// Generate a plausible forecast for offline development.
pub fn mock_forecast(lat: f64, lon: f64, days: usize) -> ForecastResponse {
    let now = Local::now().naive_local();
    let hour = now.hour() as f64;

    // Diurnal temperature variation
    let base_temp = 18.0 + 6.0 * ((hour - 9.0) * std::f64::consts::PI / 12.0).sin();
    let current = CurrentConditions {
        time: now.format("%Y-%m-%dT%H:00").to_string(),
        temperature_2m: base_temp + fastrand::f64(),
        weather_code: Some(MOCK_CODES[fastrand::usize(..MOCK_CODES.len())]),
        apparent_temperature: base_temp - 1.0 + fastrand::f64(),
        relative_humidity_2m: (40.0 + 40.0 * fastrand::f64()).round(),
        wind_speed_10m: 3.0 + 15.0 * fastrand::f64(),
    };

    let mut daily = DailySeries::default();
    for day in 0..days {
        let date = now.date() + Duration::days(day as i64);
        let high = 20.0 + 4.0 * (day as f64 * 0.7).sin() + 2.0 * fastrand::f64();
        daily.time.push(date.format("%Y-%m-%d").to_string());
        daily
            .weather_code
            .push(Some(MOCK_CODES[fastrand::usize(..MOCK_CODES.len())]));
        daily.temperature_2m_max.push(Some(high));
        daily.temperature_2m_min.push(Some(high - 6.0 - 3.0 * fastrand::f64()));
    }

    ForecastResponse {
        latitude: lat,
        longitude: lon,
        timezone: "UTC".to_string(),
        current,
        daily,
    }
}

/// Answers every request with a generated forecast for the request's
/// `latitude` / `longitude` query parameters.
#[derive(Debug, Default)]
pub struct MockWeatherNetwork;

impl MockWeatherNetwork {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Network for MockWeatherNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let coordinate = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == name)
                .and_then(|(_, value)| value.parse::<f64>().ok())
        };
        let (Some(lat), Some(lon)) = (coordinate("latitude"), coordinate("longitude")) else {
            return Ok(Response::new(400, "latitude and longitude are required")
                .with_url(request.url.as_str()));
        };

        let body = serde_json::to_vec(&mock_forecast(lat, lon, 7))
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        Ok(Response::new(200, body)
            .with_header("content-type", "application/json")
            .with_url(request.url.as_str()))
    }
}
