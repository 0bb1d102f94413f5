use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use futures::future::{select, Either};
use futures::pin_mut;
use log::{info, warn};
use serde_json::{json, Map, Value};

use crate::analytics::buffer::{iso_timestamp, EventBuffer};
use crate::analytics::page::{PageContext, PageSource};
use crate::analytics::tracker::{GtagCommand, Tracker};
use crate::consent::store::ConsentStore;
use crate::error::{ScriptError, TrackingError};

pub const PAGE_VIEW_EVENT: &str = "page_view";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Uninitialized,
    ScriptLoading,
    Ready,
    /// Script blocked, failed or timed out. Terminal.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSettings {
    pub measurement_id: String,
    pub debug_mode: bool,
}

impl AnalyticsSettings {
    pub fn config_options(&self) -> Map<String, Value> {
        let options = json!({
            "cookie_flags": "SameSite=None;Secure",
            "anonymize_ip": true,
            "send_page_view": false,
            "transport_type": "beacon",
            "debug_mode": self.debug_mode,
        });
        match options {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Gates every analytics call on consent and readiness, buffers what fails
/// and replays the buffer when the browser comes back online.
pub struct AnalyticsDispatcher {
    state: Cell<DispatcherState>,
    settings: AnalyticsSettings,
    consent: ConsentStore,
    buffer: EventBuffer,
    tracker: Rc<dyn Tracker>,
    page: Rc<dyn PageSource>,
}

fn page_view_params(page: &PageContext, path: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("page_title".into(), Value::String(page.title.clone()));
    params.insert("page_location".into(), Value::String(page.location.clone()));
    params.insert("page_path".into(), Value::String(path.to_string()));
    params
}

impl AnalyticsDispatcher {
    pub fn new(
        settings: AnalyticsSettings,
        consent: ConsentStore,
        buffer: EventBuffer,
        tracker: Rc<dyn Tracker>,
        page: Rc<dyn PageSource>,
    ) -> Self {
        Self {
            state: Cell::new(DispatcherState::Uninitialized),
            settings,
            consent,
            buffer,
            tracker,
            page,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state.get() == DispatcherState::Ready
    }

    /// Races the script load against `timeout`. The loser keeps running; only
    /// its result is ignored.
    pub async fn wait_for_script<L, T>(&self, loaded: L, timeout: T) -> Result<(), ScriptError>
    where
        L: Future<Output = Result<(), ScriptError>>,
        T: Future<Output = ()>,
    {
        if self.state.get() != DispatcherState::Uninitialized {
            return Ok(());
        }
        self.state.set(DispatcherState::ScriptLoading);

        pin_mut!(loaded);
        pin_mut!(timeout);
        let outcome = match select(loaded, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ScriptError::Timeout),
        };

        if let Err(e) = &outcome {
            warn!("Analytics script unavailable, tracking disabled: {}", e);
            self.state.set(DispatcherState::Unavailable);
        }
        outcome
    }

    /// Sends the mandatory `js` and `config` commands. Ready only if both went out.
    pub fn configure(&self) -> Result<(), TrackingError> {
        if self.state.get() != DispatcherState::ScriptLoading {
            return Ok(());
        }
        let result = self
            .tracker
            .emit(&GtagCommand::Js(iso_timestamp()))
            .and_then(|_| {
                self.tracker.emit(&GtagCommand::Config {
                    measurement_id: self.settings.measurement_id.clone(),
                    options: self.settings.config_options(),
                })
            });
        match &result {
            Ok(()) => {
                info!("Analytics configured for {}", self.settings.measurement_id);
                self.state.set(DispatcherState::Ready);
            }
            Err(e) => {
                warn!("Failed to configure Google Analytics: {}", e);
                self.state.set(DispatcherState::Unavailable);
            }
        }
        result
    }

    // Not buffered while unready: the page context would be stale on replay.
    pub fn track_page_view(&self) {
        if !self.is_ready() {
            warn!("Google Analytics not loaded yet");
            return;
        }
        if !self.consent.analytics_permitted() {
            return;
        }

        let page = self.page.current();
        let mut params = page_view_params(&page, &page.path);
        params.insert("non_interaction".into(), Value::Bool(true));

        let command = GtagCommand::Event {
            name: PAGE_VIEW_EVENT.to_string(),
            params,
        };
        if let Err(e) = self.tracker.emit(&command) {
            warn!("Analytics error: {}", e);
            self.buffer.enqueue_page_view(&page.path);
        }
    }

    pub fn track_event(&self, name: &str, params: Map<String, Value>) {
        if !self.is_ready() {
            warn!("Google Analytics not loaded yet");
            return;
        }
        if !self.consent.analytics_permitted() {
            return;
        }

        let command = GtagCommand::Event {
            name: name.to_string(),
            params,
        };
        if let Err(e) = self.tracker.emit(&command) {
            warn!("Analytics error: {}", e);
            if let GtagCommand::Event { params, .. } = command {
                self.buffer.enqueue_event(name, params);
            }
        }
    }

    pub fn retry_failed_analytics(&self) {
        if !self.is_ready() {
            warn!("Google Analytics not loaded yet");
            return;
        }
        if !self.consent.analytics_permitted() {
            info!("Analytics consent withdrawn, keeping buffered events");
            return;
        }

        if let Err(e) = self.retry_page_views().and_then(|_| self.retry_events()) {
            warn!("Failed to retry analytics: {}", e);
        }
    }

    fn retry_page_views(&self) -> Result<(), TrackingError> {
        let pending = self.buffer.pending_page_views();
        if pending.is_empty() {
            return Ok(());
        }

        let page = self.page.current();
        for view in &pending {
            let mut params = page_view_params(&page, &view.page);
            params.insert(
                "original_timestamp".into(),
                Value::String(view.timestamp.clone()),
            );
            self.tracker.emit(&GtagCommand::Event {
                name: PAGE_VIEW_EVENT.to_string(),
                params,
            })?;
        }

        self.buffer.clear_page_views();
        info!("Replayed {} buffered page views", pending.len());
        Ok(())
    }

    fn retry_events(&self) -> Result<(), TrackingError> {
        let pending = self.buffer.pending_events();
        if pending.is_empty() {
            return Ok(());
        }

        for event in &pending {
            let mut params = event.params.clone();
            params.insert(
                "original_timestamp".into(),
                Value::String(event.timestamp.clone()),
            );
            self.tracker.emit(&GtagCommand::Event {
                name: event.event.clone(),
                params,
            })?;
        }

        self.buffer.clear_events();
        info!("Replayed {} buffered events", pending.len());
        Ok(())
    }
}
