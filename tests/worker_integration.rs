//! Cache worker lifecycle and fetch strategies over real HTTP.

mod common;

use common::{config_for, go_offline, shell_origin, weather_api, OFFLINE_BODY, TIMEOUT_SECS};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use weather_pwa_server::config::Config;
use weather_pwa_server::forecast::openmeteo::{OpenMeteoClient, WeatherError};
use weather_pwa_server::worker::network::{HttpNetwork, Network, Request};
use weather_pwa_server::worker::registration::Registration;
use weather_pwa_server::worker::storage::CacheStorage;
use weather_pwa_server::worker::{CacheWorker, WorkerConfig, WorkerState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> Arc<dyn Network> {
    Arc::new(HttpNetwork::new(Duration::from_secs(TIMEOUT_SECS)).unwrap())
}

fn registration(config: &Config, storage: Arc<CacheStorage>) -> Arc<Registration> {
    let origin = Url::parse(&config.origin_url).unwrap();
    Arc::new(
        Registration::new(
            &origin,
            &format!("{}/index.html", config.base_path),
            storage,
            http(),
        )
        .unwrap(),
    )
}

async fn registered(config: &Config, storage: Arc<CacheStorage>) -> Arc<Registration> {
    let reg = registration(config, storage);
    reg.register(WorkerConfig::from_config(config).unwrap())
        .await
        .unwrap();
    reg
}

#[tokio::test]
async fn test_install_precaches_shell_from_origin() {
    let origin = shell_origin(&Config::default()).await;
    let api = MockServer::start().await;
    let config = config_for(&origin, &api);

    let storage = Arc::new(CacheStorage::new());
    let worker = CacheWorker::new(
        WorkerConfig::from_config(&config).unwrap(),
        Arc::clone(&storage),
        http(),
    );
    worker.install().await.unwrap();

    assert_eq!(worker.state(), WorkerState::Installed);
    let store = storage.get(&config.cache_version).unwrap();
    assert_eq!(store.len(), config.shell_assets().len());
}

#[tokio::test]
async fn test_install_fails_when_an_asset_is_missing() {
    let origin = MockServer::start().await;
    let api = MockServer::start().await;
    let config = config_for(&origin, &api);

    // Everything but the large icon.
    for asset in config.shell_assets() {
        if asset.ends_with("icon-512.png") {
            continue;
        }
        Mock::given(method("GET"))
            .and(path(asset.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&origin)
            .await;
    }

    let storage = Arc::new(CacheStorage::new());
    let reg = registration(&config, Arc::clone(&storage));
    let result = reg.register(WorkerConfig::from_config(&config).unwrap()).await;

    assert!(result.is_err());
    assert!(reg.controller().is_none());
    assert!(storage
        .get(&config.cache_version)
        .map(|store| store.is_empty())
        .unwrap_or(true));
}

#[tokio::test]
async fn test_shell_served_from_cache_when_origin_is_down() {
    let origin = shell_origin(&Config::default()).await;
    let api = MockServer::start().await;
    let config = config_for(&origin, &api);
    let reg = registered(&config, Arc::new(CacheStorage::new())).await;

    go_offline(&origin).await;
    let base = Url::parse(&config.origin_url).unwrap();

    let app_js = Request::get_path(&base, "/weather-pwa/app.js").unwrap();
    let response = reg.fetch(&app_js).await.unwrap();
    assert_eq!(response.text(), "asset /weather-pwa/app.js");

    let unknown = Request::get_path(&base, "/weather-pwa/settings.html").unwrap();
    let response = reg.fetch(&unknown).await.unwrap();
    assert_eq!(response.text(), OFFLINE_BODY);
}

#[tokio::test]
async fn test_shell_miss_goes_to_network_while_online() {
    let origin = shell_origin(&Config::default()).await;
    Mock::given(method("GET"))
        .and(path("/weather-pwa/about.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("about"))
        .mount(&origin)
        .await;
    let api = MockServer::start().await;
    let config = config_for(&origin, &api);
    let reg = registered(&config, Arc::new(CacheStorage::new())).await;

    let base = Url::parse(&config.origin_url).unwrap();
    let about = Request::get_path(&base, "/weather-pwa/about.html").unwrap();
    assert_eq!(reg.fetch(&about).await.unwrap().text(), "about");
}

#[tokio::test]
async fn test_forecast_survives_api_outage() {
    let origin = shell_origin(&Config::default()).await;
    let api = weather_api("40", "-75", 21.4).await;
    let config = config_for(&origin, &api);
    let reg = registered(&config, Arc::new(CacheStorage::new())).await;
    let client = OpenMeteoClient::new(&config.weather_api_url, reg.clone()).unwrap();

    let online = client.get_weather(40.0, -75.0).await.unwrap();
    assert_eq!(online.current.temperature_2m, 21.4);

    go_offline(&api).await;

    // A nearby position rounds to the same cache entry.
    let offline = client.get_weather(40.001, -75.002).await.unwrap();
    assert_eq!(offline.current.temperature_2m, 21.4);
    assert_eq!(offline.daily.time.len(), 7);

    assert!(client.get_weather(10.0, 10.0).await.is_err());
}

#[tokio::test]
async fn test_api_error_status_is_cached_and_replayed_offline() {
    let origin = shell_origin(&Config::default()).await;
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&api)
        .await;
    let config = config_for(&origin, &api);

    let storage = Arc::new(CacheStorage::new());
    let reg = registered(&config, Arc::clone(&storage)).await;
    let client = OpenMeteoClient::new(&config.weather_api_url, reg.clone()).unwrap();

    assert!(matches!(
        client.get_weather(40.0, -75.0).await,
        Err(WeatherError::FetchFailed { status: 503 })
    ));
    let store = storage.get(&config.cache_version).unwrap();
    assert_eq!(store.len(), config.shell_assets().len() + 1);

    go_offline(&api).await;
    assert!(matches!(
        client.get_weather(40.0, -75.0).await,
        Err(WeatherError::FetchFailed { status: 503 })
    ));
}

#[tokio::test]
async fn test_new_version_sweeps_old_store() {
    let origin = shell_origin(&Config::default()).await;
    let api = MockServer::start().await;
    let config = config_for(&origin, &api);
    let storage = Arc::new(CacheStorage::new());
    let reg = registered(&config, Arc::clone(&storage)).await;

    let next = Config {
        cache_version: "weather-pwa-v2".to_string(),
        ..config.clone()
    };
    reg.register(WorkerConfig::from_config(&next).unwrap())
        .await
        .unwrap();

    assert_eq!(storage.keys(), vec!["weather-pwa-v2".to_string()]);
    assert_eq!(reg.status().version.as_deref(), Some("weather-pwa-v2"));
}
