use crate::config::Config;
use crate::forecast::mock::MockWeatherNetwork;
use crate::forecast::openmeteo::OpenMeteoClient;
use crate::forecast::WeatherRoutedNetwork;
use crate::geolocation::{FixedGeolocator, PositionOptions};
use crate::page::PageContext;
use crate::routes::AppState;
use crate::worker::network::{HttpNetwork, Network};
use crate::worker::registration::Registration;
use crate::worker::storage::CacheStorage;
use crate::worker::WorkerConfig;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

/// Wire the network, register the cache worker and build the page context.
///
/// A failed worker install is logged and the app keeps running without a
/// controller, so requests go straight to the network.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let origin = Url::parse(&config.origin_url)?;
    let api_base = Url::parse(&config.weather_api_url)?;

    let http: Arc<dyn Network> = Arc::new(HttpNetwork::new(Duration::from_secs(
        config.http_timeout_secs,
    ))?);
    let network: Arc<dyn Network> = if config.weather_mock {
        tracing::info!("Serving generated forecasts instead of {}", api_base);
        Arc::new(WeatherRoutedNetwork::new(
            &api_base,
            Arc::new(MockWeatherNetwork::new()),
            http,
        ))
    } else {
        http
    };

    let registration = Arc::new(Registration::new(
        &origin,
        &format!("{}/index.html", config.base_path),
        Arc::new(CacheStorage::new()),
        network,
    )?);
    if let Err(e) = registration
        .register(WorkerConfig::from_config(&config)?)
        .await
    {
        tracing::error!("Cache worker not active: {}", e);
    }

    let client = OpenMeteoClient::new(&config.weather_api_url, registration.clone())?;
    let position_options = PositionOptions {
        timeout: Duration::from_secs(config.geolocation_timeout_secs),
        ..PositionOptions::default()
    };
    let page = Arc::new(PageContext::new(
        client,
        Arc::new(FixedGeolocator::from_config(&config)),
        position_options,
    ));

    Ok(AppState {
        config: Arc::new(config),
        origin,
        registration,
        page,
    })
}
