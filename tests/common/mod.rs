//! Shared fixtures: an upstream origin serving the app shell and an
//! Open-Meteo stand-in, both on wiremock servers.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use weather_pwa_server::config::Config;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OFFLINE_BODY: &str = "<h1>You are offline</h1>";

/// Client timeout used against the mock servers.
pub const TIMEOUT_SECS: u64 = 1;

/// Start an origin serving every shell asset of `config`.
pub async fn shell_origin(config: &Config) -> MockServer {
    let server = MockServer::start().await;
    for asset in config.shell_assets() {
        let body = if asset == config.offline_page() {
            OFFLINE_BODY.to_string()
        } else {
            format!("asset {}", asset)
        };
        Mock::given(method("GET"))
            .and(path(asset.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;
    }
    server
}

pub fn forecast_body(lat: f64, lon: f64, temperature: f64) -> Value {
    json!({
        "latitude": lat,
        "longitude": lon,
        "timezone": "America/New_York",
        "current": {
            "time": "2024-05-06T14:15",
            "temperature_2m": temperature,
            "weather_code": 2,
            "apparent_temperature": temperature - 1.0,
            "relative_humidity_2m": 55.0,
            "wind_speed_10m": 12.3
        },
        "daily": {
            "time": [
                "2024-05-06", "2024-05-07", "2024-05-08", "2024-05-09",
                "2024-05-10", "2024-05-11", "2024-05-12"
            ],
            "weather_code": [0, 1, 2, 3, 61, 71, 95],
            "temperature_2m_max": [22.4, 23.0, 19.5, 18.0, 17.2, 15.0, 20.1],
            "temperature_2m_min": [11.0, 12.6, 10.4, 9.0, 8.8, 7.5, 10.0]
        }
    })
}

/// Start an API server answering `/v1/forecast` for one position.
pub async fn weather_api(lat: &str, lon: &str, temperature: f64) -> MockServer {
    let server = MockServer::start().await;
    let body = forecast_body(lat.parse().unwrap(), lon.parse().unwrap(), temperature);
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", lat))
        .and(query_param("longitude", lon))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

pub fn config_for(origin: &MockServer, api: &MockServer) -> Config {
    Config {
        origin_url: origin.uri(),
        weather_api_url: format!("{}/v1/forecast", api.uri()),
        http_timeout_secs: TIMEOUT_SECS,
        ..Config::default()
    }
}

/// Make `server` behave like an unreachable host: every request outlives
/// the client timeout.
pub async fn go_offline(server: &MockServer) {
    server.reset().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(TIMEOUT_SECS * 5)))
        .mount(server)
        .await;
}
