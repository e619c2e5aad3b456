use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Geolocation unavailable")]
    Unavailable,
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, LocationError>;
}

/// Position from configuration. Without one, geolocation is unavailable.
#[derive(Debug, Clone, Default)]
pub struct FixedGeolocator {
    position: Option<Coordinates>,
}

impl FixedGeolocator {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        match (config.default_latitude, config.default_longitude) {
            (Some(lat), Some(lon)) => Self::new(Some(Coordinates::new(lat, lon))),
            _ => Self::new(None),
        }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, LocationError> {
        self.position.ok_or(LocationError::Unavailable)
    }
}

/// Ask `geolocator` for a position, failing with [`LocationError::Timeout`]
/// once `options.timeout` elapses.
pub async fn locate(
    geolocator: &dyn Geolocator,
    options: &PositionOptions,
) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Geolocation timed out after {:?}", options.timeout);
            Err(LocationError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverAnswers;

    #[async_trait]
    impl Geolocator for NeverAnswers {
        async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    struct Denied;

    #[async_trait]
    impl Geolocator for Denied {
        async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_fixed_position() {
        let geo = FixedGeolocator::new(Some(Coordinates::new(40.0, -75.0)));
        let coords = locate(&geo, &PositionOptions::default()).await.unwrap();
        assert_eq!(coords.latitude, 40.0);
        assert_eq!(coords.longitude, -75.0);
    }

    #[tokio::test]
    async fn test_missing_position_is_unavailable() {
        let geo = FixedGeolocator::default();
        assert_eq!(
            locate(&geo, &PositionOptions::default()).await,
            Err(LocationError::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_denied_passes_through() {
        assert_eq!(
            locate(&Denied, &PositionOptions::default()).await,
            Err(LocationError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_times_out() {
        let options = PositionOptions {
            timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let result = locate(&NeverAnswers, &options).await;
        assert_eq!(result, Err(LocationError::Timeout));
    }

    #[test]
    fn test_from_config_requires_both_coordinates() {
        let config = crate::config::Config {
            default_latitude: Some(1.0),
            ..Default::default()
        };
        assert!(FixedGeolocator::from_config(&config).position.is_none());
    }
}
