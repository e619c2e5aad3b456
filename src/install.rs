//! Deferred install prompt.
//!
//! The prompt event is held from capture until a button click consumes it;
//! the button is visible exactly while an event is retained.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserChoice {
    Accepted,
    Dismissed,
}

/// A captured install-prompt event.
#[async_trait]
pub trait PromptEvent: Send + Sync {
    /// Suppress the default install UI.
    fn prevent_default(&self);

    /// Show the prompt and wait for the user's answer.
    async fn prompt(&self) -> UserChoice;
}

#[derive(Default)]
pub struct InstallPrompt {
    deferred: Mutex<Option<Arc<dyn PromptEvent>>>,
    button_visible: AtomicBool,
}

impl InstallPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain `event`, replacing any event captured earlier, and reveal the button.
    pub fn capture(&self, event: Arc<dyn PromptEvent>) {
        event.prevent_default();
        let mut deferred = self.deferred.lock();
        if deferred.replace(event).is_some() {
            tracing::debug!("Replaced retained install prompt");
        }
        self.button_visible.store(true, Ordering::SeqCst);
    }

    pub fn is_button_visible(&self) -> bool {
        self.button_visible.load(Ordering::SeqCst)
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.lock().is_some()
    }

    /// Replay the retained prompt and wait for the choice. Returns `None`
    /// when nothing is retained.
    pub async fn click(&self) -> Option<UserChoice> {
        let event = self.deferred.lock().take()?;

        let choice = event.prompt().await;
        tracing::info!("Install prompt answered: {:?}", choice);

        // Visibility only changes under the lock, so an event captured while
        // the prompt was open keeps the button up.
        let deferred = self.deferred.lock();
        if deferred.is_none() {
            self.button_visible.store(false, Ordering::SeqCst);
        }
        Some(choice)
    }
}
