use std::cell::Cell;
use std::rc::Rc;

use log::{error, info};

use crate::analytics::dispatcher::AnalyticsDispatcher;
use crate::consent::store::{ConsentCategories, ConsentDecision, ConsentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Hidden,
    Shown,
}

/// Banner and settings-modal state behind the cookie consent UI.
pub struct ConsentController {
    store: ConsentStore,
    dispatcher: Rc<AnalyticsDispatcher>,
    banner: Cell<BannerState>,
    settings_open: Cell<bool>,
}

impl ConsentController {
    pub fn new(store: ConsentStore, dispatcher: Rc<AnalyticsDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            banner: Cell::new(BannerState::Hidden),
            settings_open: Cell::new(false),
        }
    }

    pub fn banner(&self) -> BannerState {
        self.banner.get()
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open.get()
    }

    /// The caller shows the banner after `config::BANNER_DELAY_MS`.
    pub fn needs_banner(&self) -> bool {
        self.store.decision() == ConsentDecision::Unset
    }

    /// A choice made while the delay was running keeps the banner hidden.
    pub fn show_banner(&self) -> BannerState {
        if self.needs_banner() {
            self.banner.set(BannerState::Shown);
        }
        self.banner.get()
    }

    /// Returns false when the choice could not be persisted; the UI stays as is.
    pub fn accept_all(&self) -> bool {
        if let Err(e) = self.store.set_accepted_all() {
            error!("Error accepting cookies: {}", e);
            return false;
        }
        info!("All cookies accepted");
        self.hide();
        self.dispatcher.track_page_view();
        true
    }

    pub fn save_custom(&self, categories: ConsentCategories) -> bool {
        if let Err(e) = self.store.set_custom(&categories) {
            error!("Error saving cookie settings: {}", e);
            return false;
        }
        info!("Custom cookie settings saved: {:?}", categories);
        if categories.analytics {
            self.dispatcher.track_page_view();
        }
        self.hide();
        true
    }

    /// Opens the modal preloaded with what the visitor chose last time.
    pub fn open_settings(&self) -> ConsentCategories {
        self.settings_open.set(true);
        self.store.categories().unwrap_or_default()
    }

    pub fn close_settings(&self) {
        self.settings_open.set(false);
    }

    fn hide(&self) {
        self.settings_open.set(false);
        self.banner.set(BannerState::Hidden);
    }
}
