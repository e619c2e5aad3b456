use super::types::ForecastResponse;
use crate::utils::validate_coordinates;
use crate::worker::network::{Network, NetworkError, Request, Response};
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

pub const CURRENT_FIELDS: &str =
    "temperature_2m,weather_code,apparent_temperature,relative_humidity_2m,wind_speed_10m";
pub const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Weather fetch failed")]
    FetchFailed { status: u16 },
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Single-attempt Open-Meteo client. Requests go through a [`Network`], which
/// is the worker registration in the running server.
pub struct OpenMeteoClient {
    network: Arc<dyn Network>,
    base_url: Url,
}

impl OpenMeteoClient {
    pub fn new(base_url: &str, network: Arc<dyn Network>) -> Result<Self, WeatherError> {
        Ok(Self {
            network,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn forecast_url(&self, lat: f64, lon: f64) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("latitude", &lat.to_string())
            .append_pair("longitude", &lon.to_string())
            .append_pair("current", CURRENT_FIELDS)
            .append_pair("daily", DAILY_FIELDS)
            .append_pair("timezone", "auto");
        url
    }

    pub async fn forecast_response(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Response, WeatherError> {
        validate_coordinates(lat, lon).map_err(WeatherError::InvalidCoordinates)?;

        let request = Request::get(self.forecast_url(lat, lon));
        let response = self.network.fetch(&request).await?;
        if !response.ok() {
            tracing::warn!("Weather API returned HTTP {}", response.status);
            return Err(WeatherError::FetchFailed {
                status: response.status,
            });
        }
        Ok(response)
    }

    pub async fn get_weather(&self, lat: f64, lon: f64) -> Result<ForecastResponse, WeatherError> {
        let response = self.forecast_response(lat, lon).await?;
        let forecast: ForecastResponse = serde_json::from_slice(&response.body)?;
        Ok(forecast)
    }
}
