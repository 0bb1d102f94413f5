use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const CONSENT_KEY: &str = "cookieConsent";
pub const SETTINGS_KEY: &str = "cookieSettings";

const ACCEPTED: &str = "accepted";
const CUSTOM: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    Unset,
    AcceptedAll,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Performance,
    Functionality,
    Targeting,
    Analytics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentCategories {
    pub performance: bool,
    pub functionality: bool,
    pub targeting: bool,
    pub analytics: bool,
}

impl ConsentCategories {
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Performance => self.performance,
            Category::Functionality => self.functionality,
            Category::Targeting => self.targeting,
            Category::Analytics => self.analytics,
        }
    }

    pub fn set(&mut self, category: Category, enabled: bool) {
        match category {
            Category::Performance => self.performance = enabled,
            Category::Functionality => self.functionality = enabled,
            Category::Targeting => self.targeting = enabled,
            Category::Analytics => self.analytics = enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsentStatus {
    pub decision: ConsentDecision,
    pub categories: Option<ConsentCategories>,
}

/// Persisted cookie consent. Every read failure means "no consent".
#[derive(Clone)]
pub struct ConsentStore {
    storage: Rc<dyn KeyValueStore>,
}

impl ConsentStore {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn decision(&self) -> ConsentDecision {
        match self.storage.get_item(CONSENT_KEY) {
            Ok(Some(value)) => match value.as_str() {
                ACCEPTED => ConsentDecision::AcceptedAll,
                CUSTOM => ConsentDecision::Custom,
                other => {
                    warn!("Unknown cookie consent value {:?}", other);
                    ConsentDecision::Unset
                }
            },
            Ok(None) => ConsentDecision::Unset,
            Err(e) => {
                warn!("Error reading cookie consent: {}", e);
                ConsentDecision::Unset
            }
        }
    }

    pub fn categories(&self) -> Option<ConsentCategories> {
        let raw = match self.storage.get_item(SETTINGS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Error reading cookie settings: {}", e);
                return None;
            }
        };
        // JSON `null` parses to None as well.
        match serde_json::from_str::<Option<ConsentCategories>>(&raw) {
            Ok(categories) => categories,
            Err(source) => {
                warn!(
                    "{}",
                    StorageError::Malformed {
                        key: SETTINGS_KEY,
                        source
                    }
                );
                None
            }
        }
    }

    pub fn status(&self) -> ConsentStatus {
        ConsentStatus {
            decision: self.decision(),
            categories: self.categories(),
        }
    }

    /// Stale categories are ignored once everything is accepted, so failing
    /// to drop them is not an error.
    pub fn set_accepted_all(&self) -> Result<(), StorageError> {
        if let Err(e) = self.storage.remove_item(SETTINGS_KEY) {
            warn!("Could not remove old cookie settings: {}", e);
        }
        self.storage.set_item(CONSENT_KEY, ACCEPTED)
    }

    /// Categories are written before the decision. If either write fails the
    /// stored consent is withdrawn, so a refused category is never left on.
    pub fn set_custom(&self, categories: &ConsentCategories) -> Result<(), StorageError> {
        let json = serde_json::to_string(categories).map_err(|source| StorageError::Serialize {
            key: SETTINGS_KEY,
            source,
        })?;
        let written = self
            .storage
            .set_item(SETTINGS_KEY, &json)
            .and_then(|_| self.storage.set_item(CONSENT_KEY, CUSTOM));
        if written.is_err() {
            self.withdraw();
        }
        written
    }

    fn withdraw(&self) {
        for key in [CONSENT_KEY, SETTINGS_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                warn!("Could not withdraw {}: {}", key, e);
            }
        }
    }

    pub fn is_category_enabled(&self, category: Category) -> bool {
        match self.decision() {
            ConsentDecision::AcceptedAll => true,
            ConsentDecision::Custom => self
                .categories()
                .map(|c| c.get(category))
                .unwrap_or(false),
            ConsentDecision::Unset => false,
        }
    }

    pub fn analytics_permitted(&self) -> bool {
        self.is_category_enabled(Category::Analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{FailingStorage, QuotaStorage};
    use crate::storage::MemoryStorage;

    fn store() -> (Rc<MemoryStorage>, ConsentStore) {
        let storage = Rc::new(MemoryStorage::new());
        (storage.clone(), ConsentStore::new(storage))
    }

    fn analytics_only() -> ConsentCategories {
        ConsentCategories {
            analytics: true,
            ..Default::default()
        }
    }

    #[test]
    fn fresh_store_is_unset_and_denies_everything() {
        let (_, store) = store();
        assert_eq!(store.decision(), ConsentDecision::Unset);
        assert!(!store.analytics_permitted());
        assert!(!store.is_category_enabled(Category::Performance));
    }

    #[test]
    fn accepted_all_enables_every_category() {
        let (_, store) = store();
        store.set_accepted_all().unwrap();
        assert_eq!(store.decision(), ConsentDecision::AcceptedAll);
        for category in [
            Category::Performance,
            Category::Functionality,
            Category::Targeting,
            Category::Analytics,
        ] {
            assert!(store.is_category_enabled(category));
        }
    }

    #[test]
    fn custom_follows_stored_flags() {
        let (storage, store) = store();
        store.set_custom(&analytics_only()).unwrap();

        assert_eq!(store.decision(), ConsentDecision::Custom);
        assert!(store.analytics_permitted());
        assert!(!store.is_category_enabled(Category::Targeting));
        assert_eq!(
            storage.get_item(CONSENT_KEY).unwrap().as_deref(),
            Some("custom")
        );
    }

    #[test]
    fn custom_without_analytics_denies_analytics() {
        let (_, store) = store();
        let categories = ConsentCategories {
            performance: true,
            functionality: true,
            targeting: true,
            analytics: false,
        };
        store.set_custom(&categories).unwrap();
        assert!(!store.analytics_permitted());
        assert!(store.is_category_enabled(Category::Functionality));
    }

    #[test]
    fn accept_all_clears_prior_categories() {
        let (storage, store) = store();
        store.set_custom(&analytics_only()).unwrap();
        store.set_accepted_all().unwrap();

        assert_eq!(storage.get_item(SETTINGS_KEY).unwrap(), None);
        assert_eq!(store.categories(), None);
    }

    #[test]
    fn malformed_settings_mean_no_consent() {
        let (storage, store) = store();
        storage.set_item(CONSENT_KEY, "custom").unwrap();
        storage.set_item(SETTINGS_KEY, "{analytics: yes").unwrap();

        assert_eq!(store.categories(), None);
        assert!(!store.analytics_permitted());
    }

    #[test]
    fn null_settings_mean_no_consent() {
        let (storage, store) = store();
        storage.set_item(CONSENT_KEY, "custom").unwrap();
        storage.set_item(SETTINGS_KEY, "null").unwrap();
        assert!(!store.analytics_permitted());
    }

    #[test]
    fn missing_fields_default_to_false() {
        let (storage, store) = store();
        storage.set_item(CONSENT_KEY, "custom").unwrap();
        storage.set_item(SETTINGS_KEY, r#"{"analytics":true}"#).unwrap();

        let categories = store.categories().unwrap();
        assert!(categories.analytics);
        assert!(!categories.performance);
    }

    #[test]
    fn unknown_consent_value_is_unset() {
        let (storage, store) = store();
        storage.set_item(CONSENT_KEY, "maybe").unwrap();
        assert_eq!(store.decision(), ConsentDecision::Unset);
        assert!(!store.analytics_permitted());
    }

    #[test]
    fn storage_failure_fails_closed() {
        let store = ConsentStore::new(Rc::new(FailingStorage));
        assert_eq!(store.decision(), ConsentDecision::Unset);
        assert!(!store.analytics_permitted());
        assert!(store.set_accepted_all().is_err());
    }

    #[test]
    fn failed_settings_write_withdraws_consent() {
        let storage = Rc::new(QuotaStorage::new());
        let store = ConsentStore::new(storage.clone());
        store.set_custom(&analytics_only()).unwrap();
        assert!(store.analytics_permitted());

        storage.reject_writes_to(SETTINGS_KEY);
        assert!(store.set_custom(&ConsentCategories::default()).is_err());

        assert_eq!(store.decision(), ConsentDecision::Unset);
        assert_eq!(store.categories(), None);
        assert!(!store.analytics_permitted());
    }

    #[test]
    fn failed_decision_write_after_accept_all_withdraws_consent() {
        let storage = Rc::new(QuotaStorage::new());
        let store = ConsentStore::new(storage.clone());
        store.set_accepted_all().unwrap();

        storage.reject_writes_to(CONSENT_KEY);
        assert!(store.set_custom(&ConsentCategories::default()).is_err());

        assert_eq!(store.decision(), ConsentDecision::Unset);
        assert!(!store.analytics_permitted());
    }

    #[test]
    fn accept_all_survives_failed_settings_removal() {
        let storage = Rc::new(QuotaStorage::new());
        let store = ConsentStore::new(storage.clone());
        store.set_custom(&ConsentCategories::default()).unwrap();

        storage.fail_removes();
        assert!(store.set_accepted_all().is_ok());

        assert_eq!(store.decision(), ConsentDecision::AcceptedAll);
        assert!(store.analytics_permitted());
    }

    #[test]
    fn status_reports_decision_and_settings() {
        let (_, store) = store();
        store.set_custom(&analytics_only()).unwrap();
        let status = store.status();
        assert_eq!(status.decision, ConsentDecision::Custom);
        assert_eq!(status.categories, Some(analytics_only()));
    }

    #[test]
    fn categories_set_and_get_round_trip_by_name() {
        let mut categories = ConsentCategories::default();
        categories.set(Category::Targeting, true);
        assert!(categories.get(Category::Targeting));
        assert!(!categories.get(Category::Analytics));
    }
}
