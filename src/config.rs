use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_CACHE_VERSION: &str = "weather-pwa-v1";
pub const DEFAULT_BASE_PATH: &str = "/weather-pwa";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    /// Upstream origin the app shell is fetched from.
    pub origin_url: String,
    pub base_path: String,
    pub cache_version: String,
    pub weather_api_url: String,
    pub http_timeout_secs: u64,
    pub geolocation_timeout_secs: u64,
    pub default_latitude: Option<f64>,
    pub default_longitude: Option<f64>,
    pub weather_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0:8080".to_string(),
            origin_url: "http://127.0.0.1:8000".to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            cache_version: DEFAULT_CACHE_VERSION.to_string(),
            weather_api_url: DEFAULT_WEATHER_API_URL.to_string(),
            http_timeout_secs: 30,
            geolocation_timeout_secs: 10,
            default_latitude: None,
            default_longitude: None,
            weather_mock: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            origin_url: env::var("ORIGIN_URL").unwrap_or(defaults.origin_url),
            base_path: normalize_base_path(
                &env::var("BASE_PATH").unwrap_or(defaults.base_path),
            ),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            weather_api_url: env::var("WEATHER_API_URL").unwrap_or(defaults.weather_api_url),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS")?
                .unwrap_or(defaults.http_timeout_secs),
            geolocation_timeout_secs: parse_var("GEOLOCATION_TIMEOUT_SECS")?
                .unwrap_or(defaults.geolocation_timeout_secs),
            default_latitude: parse_var("DEFAULT_LATITUDE")?,
            default_longitude: parse_var("DEFAULT_LONGITUDE")?,
            weather_mock: parse_var("WEATHER_MOCK")?.unwrap_or(defaults.weather_mock),
        })
    }

    /// Root-relative paths precached at install time.
    pub fn shell_assets(&self) -> Vec<String> {
        let base = &self.base_path;
        vec![
            format!("{base}/"),
            format!("{base}/index.html"),
            format!("{base}/styles.css"),
            format!("{base}/app.js"),
            self.offline_page(),
            format!("{base}/icons/icon-192.png"),
            format!("{base}/icons/icon-512.png"),
            format!("{base}/manifest.webmanifest"),
        ]
    }

    pub fn offline_page(&self) -> String {
        format!("{}/offline.html", self.base_path)
    }
}

fn parse_var<T: FromStr>(name: &str) -> anyhow::Result<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", name, raw)),
        _ => Ok(None),
    }
}

/// `"weather-pwa/"` and `"/weather-pwa"` both become `"/weather-pwa"`; `"/"` becomes `""`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
