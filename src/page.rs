//! Page initialization flow and the page-level event wiring.

use crate::events::{Dispatcher, Event, EventKind, Invocation};
use crate::forecast::openmeteo::{OpenMeteoClient, WeatherError};
use crate::geolocation::{locate, Coordinates, Geolocator, LocationError, PositionOptions};
use crate::install::{InstallPrompt, PromptEvent, UserChoice};
use crate::render::{render, Page};
use std::sync::Arc;
use thiserror::Error;

pub const STATUS_LOCATING: &str = "Requesting location…";
pub const STATUS_FETCHING: &str = "Fetching weather…";
pub const STATUS_FAILED: &str =
    "Allow location to see local weather. You can also refresh and try again.";

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
}

#[derive(Clone)]
pub enum PageEvent {
    BeforeInstallPrompt(Arc<dyn PromptEvent>),
    AppInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEventKind {
    BeforeInstallPrompt,
    AppInstalled,
}

impl EventKind for PageEventKind {
    fn invocation(&self) -> Invocation {
        match self {
            // The browser may offer the prompt again after a dismissal.
            PageEventKind::BeforeInstallPrompt => Invocation::Repeated,
            PageEventKind::AppInstalled => Invocation::Once,
        }
    }
}

impl Event for PageEvent {
    type Kind = PageEventKind;

    fn kind(&self) -> PageEventKind {
        match self {
            PageEvent::BeforeInstallPrompt(_) => PageEventKind::BeforeInstallPrompt,
            PageEvent::AppInstalled => PageEventKind::AppInstalled,
        }
    }
}

/// Long-lived page state: the weather client, the position source, and the
/// retained install prompt.
pub struct PageContext {
    client: OpenMeteoClient,
    geolocator: Arc<dyn Geolocator>,
    position_options: PositionOptions,
    install: Arc<InstallPrompt>,
    events: Dispatcher<PageEvent>,
}

impl PageContext {
    pub fn new(
        client: OpenMeteoClient,
        geolocator: Arc<dyn Geolocator>,
        position_options: PositionOptions,
    ) -> Self {
        let install = Arc::new(InstallPrompt::new());
        let events = Dispatcher::new();

        let captured = Arc::clone(&install);
        events.on(PageEventKind::BeforeInstallPrompt, move |event| {
            if let PageEvent::BeforeInstallPrompt(prompt) = event {
                captured.capture(Arc::clone(prompt));
            }
        });

        Self {
            client,
            geolocator,
            position_options,
            install,
            events,
        }
    }

    pub fn events(&self) -> &Dispatcher<PageEvent> {
        &self.events
    }

    pub fn install_prompt(&self) -> &Arc<InstallPrompt> {
        &self.install
    }

    pub fn client(&self) -> &OpenMeteoClient {
        &self.client
    }

    pub async fn click_install(&self) -> Option<UserChoice> {
        self.install.click().await
    }

    /// Build a fresh page. Explicit coordinates skip geolocation. Any failure
    /// leaves only the status message on the page.
    pub async fn load(&self, coords: Option<Coordinates>) -> Page {
        let mut page = Page::new();
        page.install_button_visible = self.install.is_button_visible();

        if let Err(e) = self.populate(&mut page, coords).await {
            tracing::error!("Page load failed: {}", e);
            page.fail(STATUS_FAILED);
        }
        page
    }

    async fn populate(&self, page: &mut Page, coords: Option<Coordinates>) -> Result<(), PageError> {
        page.set_status(STATUS_LOCATING);
        let position = match coords {
            Some(coords) => coords,
            None => locate(self.geolocator.as_ref(), &self.position_options).await?,
        };

        page.set_status(STATUS_FETCHING);
        let data = self
            .client
            .get_weather(position.latitude, position.longitude)
            .await?;

        render(page, &data);
        Ok(())
    }
}
