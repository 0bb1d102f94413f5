use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use log::{info, warn};

use crate::analytics::buffer::EventBuffer;
use crate::analytics::dispatcher::{AnalyticsDispatcher, AnalyticsSettings};
use crate::analytics::page::{current_hostname, BrowserPage, PageSource};
use crate::analytics::script::load_script;
use crate::analytics::tracker::{install_data_layer, GtagTracker, Tracker};
use crate::config;
use crate::consent::controller::ConsentController;
use crate::consent::store::ConsentStore;
use crate::contact::client::ContactClient;
use crate::storage::{open_storage, KeyValueStore};

struct Inner {
    consent_store: ConsentStore,
    dispatcher: Rc<AnalyticsDispatcher>,
    consent: ConsentController,
    contact: ContactClient,
}

/// Everything the UI needs, built once at startup and handed down through
/// a Yew context.
#[derive(Clone)]
pub struct Services(Rc<Inner>);

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Services {
    pub fn new(
        storage: Rc<dyn KeyValueStore>,
        tracker: Rc<dyn Tracker>,
        page: Rc<dyn PageSource>,
        settings: AnalyticsSettings,
        contact: ContactClient,
    ) -> Self {
        let consent_store = ConsentStore::new(storage.clone());
        let dispatcher = Rc::new(AnalyticsDispatcher::new(
            settings,
            consent_store.clone(),
            EventBuffer::new(storage),
            tracker,
            page,
        ));
        let consent = ConsentController::new(consent_store.clone(), dispatcher.clone());
        Self(Rc::new(Inner {
            consent_store,
            dispatcher,
            consent,
            contact,
        }))
    }

    pub fn browser() -> Self {
        let hostname = current_hostname();
        let settings = AnalyticsSettings {
            measurement_id: config::GA_MEASUREMENT_ID.to_string(),
            debug_mode: config::analytics_debug_mode(&hostname),
        };
        let contact = ContactClient::new(config::FORMS_ENDPOINT, config::web3forms_access_key());
        if !contact.is_enabled() {
            warn!("Web3Forms API key not found. Contact forms will not work.");
        }
        Self::new(
            open_storage(),
            Rc::new(GtagTracker),
            Rc::new(BrowserPage),
            settings,
            contact,
        )
    }

    pub fn consent_store(&self) -> &ConsentStore {
        &self.0.consent_store
    }

    pub fn dispatcher(&self) -> &AnalyticsDispatcher {
        &self.0.dispatcher
    }

    pub fn consent(&self) -> &ConsentController {
        &self.0.consent
    }

    pub fn contact(&self) -> &ContactClient {
        &self.0.contact
    }

    /// Loads gtag, configures it and sends the first page view if the
    /// visitor already consented on an earlier visit.
    pub async fn start_analytics(&self) {
        if let Err(e) = install_data_layer() {
            warn!("Could not set up dataLayer: {}", e);
            return;
        }
        let loaded = load_script(&config::gtag_script_url());
        let timeout = TimeoutFuture::new(config::SCRIPT_TIMEOUT_MS);
        if self.dispatcher().wait_for_script(loaded, timeout).await.is_err() {
            return;
        }

        TimeoutFuture::new(config::SCRIPT_SETTLE_MS).await;
        if self.dispatcher().configure().is_ok() {
            info!("Analytics ready");
            self.dispatcher().track_page_view();
        }
    }
}
