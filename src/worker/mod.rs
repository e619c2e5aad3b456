//! Offline cache worker.
//!
//! Lifecycle follows the service-worker model: `install` precaches the app
//! shell into the store named by the current version, `activate` sweeps every
//! other store, and `handle_fetch` answers intercepted requests with either a
//! network-first (weather API) or cache-first (everything else) strategy.

pub mod network;
pub mod registration;
pub mod storage;

use crate::config::Config;
use crate::utils::round_to_decimals;
use async_trait::async_trait;
use futures::future::try_join_all;
use network::{Network, NetworkError, Request, Response};
use parking_lot::RwLock;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use storage::{CacheStorage, CacheStore, RequestKey};
use thiserror::Error;

/// Decimal places kept for `latitude` / `longitude` in weather API cache keys.
pub const API_KEY_COORDINATE_DECIMALS: u32 = 2;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Invalid shell asset path {0}: {1}")]
    InvalidPath(String, url::ParseError),
    #[error("Failed to fetch shell asset {0}: {1}")]
    FetchFailed(String, NetworkError),
    #[error("Shell asset {0} returned HTTP {1}")]
    BadStatus(String, u16),
    #[error("Worker cannot install from state {0:?}")]
    InvalidState(WorkerState),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network failed and nothing is cached for {0}")]
    NoCachedResponse(String),
    #[error("Network failed and the offline page is not cached")]
    NoOfflinePage,
}

impl From<FetchError> for NetworkError {
    fn from(err: FetchError) -> Self {
        NetworkError::NoResponse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    NetworkFirst,
    CacheFirst,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Store name; also the version tag swept against on activation.
    pub cache_name: String,
    /// Origin the shell paths and the offline page are resolved against.
    pub origin: Url,
    pub shell_assets: Vec<String>,
    pub offline_page: String,
    /// Requests sharing this origin get the network-first strategy.
    pub api_base: Url,
}

impl WorkerConfig {
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        Ok(Self {
            cache_name: config.cache_version.clone(),
            origin: Url::parse(&config.origin_url)?,
            shell_assets: config.shell_assets(),
            offline_page: config.offline_page(),
            api_base: Url::parse(&config.weather_api_url)?,
        })
    }
}

pub struct CacheWorker {
    config: WorkerConfig,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
}

impl CacheWorker {
    pub fn new(
        config: WorkerConfig,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            config,
            storage,
            network,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write();
        tracing::debug!(
            "Worker {} state {:?} -> {:?}",
            self.config.cache_name,
            *current,
            state
        );
        *current = state;
    }

    fn store(&self) -> Arc<CacheStore> {
        self.storage.open(&self.config.cache_name)
    }

    /// Precache every shell asset. All assets are fetched before any is
    /// stored, so a failed install leaves the store empty.
    pub async fn install(&self) -> Result<(), InstallError> {
        let state = self.state();
        if state != WorkerState::Parsed {
            return Err(InstallError::InvalidState(state));
        }
        self.set_state(WorkerState::Installing);

        match self.precache().await {
            Ok(count) => {
                self.set_state(WorkerState::Installed);
                tracing::info!(
                    "Installed worker {} with {} shell assets",
                    self.config.cache_name,
                    count
                );
                Ok(())
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                tracing::error!("Worker {} install failed: {}", self.config.cache_name, e);
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, InstallError> {
        let requests = self
            .config
            .shell_assets
            .iter()
            .map(|path| {
                Request::get_path(&self.config.origin, path)
                    .map(|request| (path.clone(), request))
                    .map_err(|e| InstallError::InvalidPath(path.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|(path, request)| async move {
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|e| InstallError::FetchFailed(path.clone(), e))?;
            if !response.ok() {
                return Err(InstallError::BadStatus(path.clone(), response.status));
            }
            Ok(response)
        }))
        .await?;

        let store = self.store();
        for ((path, request), response) in requests.iter().zip(responses) {
            if let Err(e) = store.put(request, response).await {
                tracing::warn!("Skipping shell asset {}: {}", path, e);
            }
        }
        Ok(requests.len())
    }

    /// Delete every store whose name is not the current version.
    /// Returns the names that were swept.
    pub async fn activate(&self) -> Vec<String> {
        self.set_state(WorkerState::Activating);

        let mut swept = Vec::new();
        for name in self.storage.keys() {
            if name != self.config.cache_name && self.storage.delete(&name) {
                tracing::info!("Deleted stale cache store {}", name);
                swept.push(name);
            }
        }

        self.set_state(WorkerState::Activated);
        tracing::info!("Activated worker {}", self.config.cache_name);
        swept
    }

    pub fn strategy_for(&self, request: &Request) -> FetchStrategy {
        if request.url.origin() == self.config.api_base.origin() {
            FetchStrategy::NetworkFirst
        } else {
            FetchStrategy::CacheFirst
        }
    }

    pub async fn handle_fetch(&self, request: &Request) -> Result<Response, FetchError> {
        match self.strategy_for(request) {
            FetchStrategy::NetworkFirst => self.network_first(request).await,
            FetchStrategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> Result<Response, FetchError> {
        let key = api_cache_key(request);

        match self.network.fetch(request).await {
            Ok(response) => {
                // Any status is stored; the last answer wins.
                if let Err(e) = self
                    .store()
                    .put_key(&request.method, key, response.clone())
                    .await
                {
                    tracing::warn!("Not caching {}: {}", request.url, e);
                }
                Ok(response)
            }
            Err(e) => {
                tracing::warn!("Network failed for {}, trying cache: {}", request.url, e);
                self.storage
                    .match_key(&key)
                    .await
                    .ok_or_else(|| FetchError::NoCachedResponse(request.url.to_string()))
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Result<Response, FetchError> {
        if let Some(cached) = self.storage.match_request(request).await {
            tracing::debug!("Cache hit {}", request.url);
            return Ok(cached);
        }
        tracing::debug!("Cache miss {}", request.url);

        match self.network.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!("Network failed for {}, serving offline page: {}", request.url, e);
                let offline = Request::get_path(&self.config.origin, &self.config.offline_page)
                    .map_err(|_| FetchError::NoOfflinePage)?;
                self.storage
                    .match_request(&offline)
                    .await
                    .ok_or(FetchError::NoOfflinePage)
            }
        }
    }
}

#[async_trait]
impl Network for CacheWorker {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        Ok(self.handle_fetch(request).await?)
    }
}

/// Weather API entries are keyed with coordinates rounded to
/// [`API_KEY_COORDINATE_DECIMALS`], so nearby positions share one entry.
pub fn api_cache_key(request: &Request) -> RequestKey {
    let mut url = request.url.clone();
    let pairs: Vec<(String, String)> = request
        .url
        .query_pairs()
        .map(|(name, value)| {
            let value = match name.as_ref() {
                "latitude" | "longitude" => value
                    .parse::<f64>()
                    .map(|v| {
                        // `+ 0.0` folds -0.0 into 0.0
                        format!(
                            "{:.*}",
                            API_KEY_COORDINATE_DECIMALS as usize,
                            round_to_decimals(v, API_KEY_COORDINATE_DECIMALS) + 0.0
                        )
                    })
                    .unwrap_or_else(|_| value.into_owned()),
                _ => value.into_owned(),
            };
            (name.into_owned(), value)
        })
        .collect();

    if !pairs.is_empty() {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    RequestKey::new(&request.method, &url)
}
