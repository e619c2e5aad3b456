use super::network::{Network, NetworkError, Request, Response};
use super::storage::CacheStorage;
use super::{CacheWorker, InstallError, WorkerConfig, WorkerState};
use crate::events::{Dispatcher, Event, EventKind, Invocation};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;

pub const WORKER_SCRIPT: &str = "sw.js";

/// Registration scope for a page path: the directory of a file path
/// (`/app/index.html` → `/app/`), or the path itself with a trailing slash.
pub fn scope_for_path(pathname: &str) -> String {
    let last_segment = pathname.rsplit('/').next().unwrap_or("");
    let has_extension = last_segment
        .rsplit_once('.')
        .map(|(_, ext)| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(false);

    if has_extension {
        match pathname.rfind('/') {
            Some(idx) => pathname[..=idx].to_string(),
            None => "/".to_string(),
        }
    } else if pathname.ends_with('/') {
        pathname.to_string()
    } else {
        format!("{}/", pathname)
    }
}

pub fn script_url(origin: &Url, scope: &str) -> Result<Url, url::ParseError> {
    origin.join(scope)?.join(WORKER_SCRIPT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    Installed { version: String },
    InstallFailed { version: String, reason: String },
    Activated { version: String },
    ControllerChange { version: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationEventKind {
    Installed,
    InstallFailed,
    Activated,
    ControllerChange,
}

impl EventKind for RegistrationEventKind {
    fn invocation(&self) -> Invocation {
        match self {
            Self::Installed | Self::Activated => Invocation::Once,
            Self::InstallFailed | Self::ControllerChange => Invocation::Repeated,
        }
    }
}

impl Event for RegistrationEvent {
    type Kind = RegistrationEventKind;

    fn kind(&self) -> RegistrationEventKind {
        match self {
            Self::Installed { .. } => RegistrationEventKind::Installed,
            Self::InstallFailed { .. } => RegistrationEventKind::InstallFailed,
            Self::Activated { .. } => RegistrationEventKind::Activated,
            Self::ControllerChange { .. } => RegistrationEventKind::ControllerChange,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationStatus {
    pub scope: String,
    pub script_url: String,
    pub version: Option<String>,
    pub state: Option<WorkerState>,
    pub controlled: bool,
    pub cache_stores: Vec<String>,
}

/// Tracks the worker controlling a scope. Requests issued through the
/// registration are intercepted by the controller, or go straight to the
/// network while nothing controls the scope.
pub struct Registration {
    scope: String,
    script_url: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    controller: RwLock<Option<Arc<CacheWorker>>>,
    events: Dispatcher<RegistrationEvent>,
}

impl Registration {
    pub fn new(
        origin: &Url,
        page_path: &str,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Result<Self, url::ParseError> {
        let scope = scope_for_path(page_path);
        let script_url = script_url(origin, &scope)?;
        Ok(Self {
            scope,
            script_url,
            storage,
            network,
            controller: RwLock::new(None),
            events: Dispatcher::new(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn script_url(&self) -> &Url {
        &self.script_url
    }

    pub fn events(&self) -> &Dispatcher<RegistrationEvent> {
        &self.events
    }

    pub fn controller(&self) -> Option<Arc<CacheWorker>> {
        self.controller.read().clone()
    }

    /// Install a worker for `config`, then activate it and claim the scope
    /// without waiting for open pages to close. A failed install leaves the
    /// current controller in place.
    pub async fn register(&self, config: WorkerConfig) -> Result<Arc<CacheWorker>, InstallError> {
        tracing::info!(
            "Registering worker {} for scope {} ({})",
            config.cache_name,
            self.scope,
            self.script_url
        );
        let version = config.cache_name.clone();
        let worker = Arc::new(CacheWorker::new(
            config,
            Arc::clone(&self.storage),
            Arc::clone(&self.network),
        ));

        if let Err(e) = worker.install().await {
            self.events.dispatch(&RegistrationEvent::InstallFailed {
                version,
                reason: e.to_string(),
            });
            return Err(e);
        }
        self.events.dispatch(&RegistrationEvent::Installed {
            version: version.clone(),
        });

        worker.activate().await;
        self.events.dispatch(&RegistrationEvent::Activated {
            version: version.clone(),
        });
        self.claim(Arc::clone(&worker));
        Ok(worker)
    }

    fn claim(&self, worker: Arc<CacheWorker>) {
        let version = worker.cache_name().to_string();
        let previous = self.controller.write().replace(worker);
        if let Some(previous) = previous {
            tracing::info!("Worker {} replaced {}", version, previous.cache_name());
        }
        self.events
            .dispatch(&RegistrationEvent::ControllerChange { version });
    }

    pub fn status(&self) -> RegistrationStatus {
        let controller = self.controller();
        RegistrationStatus {
            scope: self.scope.clone(),
            script_url: self.script_url.to_string(),
            version: controller.as_ref().map(|w| w.cache_name().to_string()),
            state: controller.as_ref().map(|w| w.state()),
            controlled: controller.is_some(),
            cache_stores: self.storage.keys(),
        }
    }
}

#[async_trait]
impl Network for Registration {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        match self.controller() {
            Some(worker) => worker.fetch(request).await,
            None => self.network.fetch(request).await,
        }
    }
}
