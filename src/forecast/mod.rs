pub mod mock;
pub mod openmeteo;
pub mod types;

use crate::worker::network::{Network, NetworkError, Request, Response};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;

/// Sends weather API requests to one network and everything else to another.
/// Used to plug [`mock::MockWeatherNetwork`] in underneath the cache worker.
pub struct WeatherRoutedNetwork {
    api_origin: url::Origin,
    weather: Arc<dyn Network>,
    other: Arc<dyn Network>,
}

impl WeatherRoutedNetwork {
    pub fn new(api_base: &Url, weather: Arc<dyn Network>, other: Arc<dyn Network>) -> Self {
        Self {
            api_origin: api_base.origin(),
            weather,
            other,
        }
    }
}

#[async_trait]
impl Network for WeatherRoutedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        if request.url.origin() == self.api_origin {
            self.weather.fetch(request).await
        } else {
            self.other.fetch(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::tests::FakeNetwork;

    #[tokio::test]
    async fn test_routes_by_origin() {
        let api = Url::parse("https://api.open-meteo.com/v1/forecast").unwrap();
        let other = Arc::new(FakeNetwork::default().with("http://app.test/x", Response::new(200, "x")));
        let net = WeatherRoutedNetwork::new(&api, Arc::new(mock::MockWeatherNetwork::new()), other);

        let weather = net
            .fetch(&Request::get(
                Url::parse("https://api.open-meteo.com/v1/forecast?latitude=1&longitude=2").unwrap(),
            ))
            .await
            .unwrap();
        let asset = net
            .fetch(&Request::get(Url::parse("http://app.test/x").unwrap()))
            .await
            .unwrap();

        assert_eq!(weather.content_type(), Some("application/json"));
        assert_eq!(asset.text(), "x");
    }
}
