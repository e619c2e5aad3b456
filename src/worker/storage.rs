//! Named cache stores holding request → response pairs.
//!
//! Each store is an unbounded moka cache: individual operations are atomic,
//! entries never expire on their own, and a store disappears only when it is
//! deleted by name.

use super::network::{Request, Response};
use moka::future::Cache;
use parking_lot::RwLock;
use reqwest::{Method, Url};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Only GET requests can be cached, got {0}")]
    UnsupportedMethod(Method),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        Self(format!("{} {}", method, url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URL part of the key.
    pub fn url(&self) -> &str {
        self.0.split_once(' ').map(|(_, url)| url).unwrap_or(&self.0)
    }
}

impl From<&Request> for RequestKey {
    fn from(request: &Request) -> Self {
        Self::new(&request.method, &request.url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CacheStore {
    name: String,
    entries: Cache<RequestKey, Response>,
}

impl CacheStore {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Cache::builder().name(name).build(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store `response` under the request's own key, replacing any previous entry.
    pub async fn put(&self, request: &Request, response: Response) -> Result<(), CacheError> {
        self.put_key(&request.method, RequestKey::from(request), response)
            .await
    }

    /// Store under an explicit key (used when the key is normalized).
    pub async fn put_key(
        &self,
        method: &Method,
        key: RequestKey,
        response: Response,
    ) -> Result<(), CacheError> {
        if method != Method::GET {
            return Err(CacheError::UnsupportedMethod(method.clone()));
        }
        self.entries.insert(key, response).await;
        Ok(())
    }

    pub async fn match_request(&self, request: &Request) -> Option<Response> {
        if request.method != Method::GET {
            return None;
        }
        self.match_key(&RequestKey::from(request)).await
    }

    pub async fn match_key(&self, key: &RequestKey) -> Option<Response> {
        self.entries.get(key).await
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<RequestKey> {
        let mut keys: Vec<RequestKey> = self
            .entries
            .iter()
            .map(|(key, _)| RequestKey::clone(&key))
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}

/// All stores of one origin, in creation order.
#[derive(Debug, Default)]
pub struct CacheStorage {
    stores: RwLock<Vec<Arc<CacheStore>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the named store, creating it when absent.
    pub fn open(&self, name: &str) -> Arc<CacheStore> {
        if let Some(store) = self.get(name) {
            return store;
        }

        let mut stores = self.stores.write();
        // Another caller may have created it between the read and the write lock.
        if let Some(store) = stores.iter().find(|s| s.name() == name) {
            return Arc::clone(store);
        }
        let store = Arc::new(CacheStore::new(name));
        stores.push(Arc::clone(&store));
        tracing::debug!("Opened cache store {}", name);
        store
    }

    pub fn get(&self, name: &str) -> Option<Arc<CacheStore>> {
        self.stores
            .read()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn delete(&self, name: &str) -> bool {
        let mut stores = self.stores.write();
        let before = stores.len();
        stores.retain(|s| s.name() != name);
        before != stores.len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.stores
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// First match across every store, oldest store first.
    pub async fn match_request(&self, request: &Request) -> Option<Response> {
        self.match_key(&RequestKey::from(request)).await
    }

    pub async fn match_key(&self, key: &RequestKey) -> Option<Response> {
        let stores: Vec<Arc<CacheStore>> = self.stores.read().clone();
        for store in stores {
            if let Some(response) = store.match_key(key).await {
                return Some(response);
            }
        }
        None
    }
}
