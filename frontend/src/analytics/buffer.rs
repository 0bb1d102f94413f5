use std::rc::Rc;

use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::storage::KeyValueStore;

pub const FAILED_EVENTS_KEY: &str = "failedEvents";
pub const FAILED_PAGE_VIEWS_KEY: &str = "failedPageViews";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEvent {
    pub timestamp: String,
    pub event: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPageView {
    pub timestamp: String,
    pub page: String,
}

/// Same shape as `Date.prototype.toISOString`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Best-effort queues of analytics that could not be sent.
///
/// Nothing here surfaces an error: a lost entry only costs one data point.
#[derive(Clone)]
pub struct EventBuffer {
    storage: Rc<dyn KeyValueStore>,
}

impl EventBuffer {
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn enqueue_event(&self, name: &str, params: Map<String, Value>) {
        let entry = FailedEvent {
            timestamp: iso_timestamp(),
            event: name.to_string(),
            params,
        };
        if let Err(e) = self.append(FAILED_EVENTS_KEY, entry) {
            warn!("Failed to store analytics event: {}", e);
        }
    }

    pub fn enqueue_page_view(&self, page: &str) {
        let entry = FailedPageView {
            timestamp: iso_timestamp(),
            page: page.to_string(),
        };
        if let Err(e) = self.append(FAILED_PAGE_VIEWS_KEY, entry) {
            warn!("Failed to store page view: {}", e);
        }
    }

    pub fn pending_events(&self) -> Vec<FailedEvent> {
        self.snapshot(FAILED_EVENTS_KEY)
    }

    pub fn pending_page_views(&self) -> Vec<FailedPageView> {
        self.snapshot(FAILED_PAGE_VIEWS_KEY)
    }

    pub fn clear_events(&self) {
        self.clear(FAILED_EVENTS_KEY);
    }

    pub fn clear_page_views(&self) {
        self.clear(FAILED_PAGE_VIEWS_KEY);
    }

    fn snapshot<T: DeserializeOwned>(&self, key: &'static str) -> Vec<T> {
        match self.read(key) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable {} queue: {}", key, e);
                Vec::new()
            }
        }
    }

    /// A broken entry is skipped on its own; the rest of the queue survives.
    fn read<T: DeserializeOwned>(&self, key: &'static str) -> Result<Vec<T>, StorageError> {
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(Vec::new());
        };
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .map_err(|source| StorageError::Malformed { key, source })?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Dropping malformed {} entry: {}", key, e);
                    None
                }
            })
            .collect())
    }

    // Read-modify-write; another tab appending at the same moment can lose an entry.
    fn append<T: Serialize + DeserializeOwned>(
        &self,
        key: &'static str,
        entry: T,
    ) -> Result<(), StorageError> {
        let mut entries: Vec<T> = self.read(key).unwrap_or_else(|e| {
            warn!("Replacing unreadable {} queue: {}", key, e);
            Vec::new()
        });
        entries.push(entry);
        let json = serde_json::to_string(&entries)
            .map_err(|source| StorageError::Serialize { key, source })?;
        self.storage.set_item(key, &json)
    }

    fn clear(&self, key: &'static str) {
        if let Err(e) = self.storage.remove_item(key) {
            warn!("Failed to clear {} queue: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FailingStorage;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn buffer() -> (Rc<MemoryStorage>, EventBuffer) {
        let storage = Rc::new(MemoryStorage::new());
        (storage.clone(), EventBuffer::new(storage))
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn events_keep_insertion_order() {
        let (_, buffer) = buffer();
        buffer.enqueue_event("first", params(json!({"n": 1})));
        buffer.enqueue_event("second", params(json!({"n": 2})));
        buffer.enqueue_event("third", Map::new());

        let names: Vec<_> = buffer
            .pending_events()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn page_view_queue_is_separate() {
        let (storage, buffer) = buffer();
        buffer.enqueue_page_view("/pricing");

        assert!(buffer.pending_events().is_empty());
        assert_eq!(buffer.pending_page_views()[0].page, "/pricing");
        assert!(storage.get_item(FAILED_EVENTS_KEY).unwrap().is_none());
    }

    #[test]
    fn stored_layout_matches_wire_keys() {
        let (storage, buffer) = buffer();
        buffer.enqueue_event("signup", params(json!({"plan": "pro"})));

        let raw = storage.get_item(FAILED_EVENTS_KEY).unwrap().unwrap();
        let stored: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored[0]["event"], "signup");
        assert_eq!(stored[0]["params"]["plan"], "pro");
        assert!(stored[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn clear_empties_only_its_queue() {
        let (_, buffer) = buffer();
        buffer.enqueue_event("x", Map::new());
        buffer.enqueue_page_view("/");

        buffer.clear_events();
        assert!(buffer.pending_events().is_empty());
        assert_eq!(buffer.pending_page_views().len(), 1);
    }

    #[test]
    fn malformed_queue_reads_as_empty_and_is_replaced_on_append() {
        let (storage, buffer) = buffer();
        storage.set_item(FAILED_PAGE_VIEWS_KEY, "not json").unwrap();
        assert!(buffer.pending_page_views().is_empty());

        buffer.enqueue_page_view("/about");
        assert_eq!(buffer.pending_page_views().len(), 1);
    }

    #[test]
    fn one_bad_entry_does_not_sink_the_queue() {
        let (storage, buffer) = buffer();
        let stored = json!([
            {"timestamp": "2024-05-01T10:00:00.000Z", "event": "signup", "params": {}},
            {"timestamp": "2024-05-01T10:00:01.000Z", "params": {}},
        ]);
        storage
            .set_item(FAILED_EVENTS_KEY, &stored.to_string())
            .unwrap();

        let names: Vec<_> = buffer.pending_events().into_iter().map(|e| e.event).collect();
        assert_eq!(names, ["signup"]);

        buffer.enqueue_event("next", Map::new());
        let names: Vec<_> = buffer.pending_events().into_iter().map(|e| e.event).collect();
        assert_eq!(names, ["signup", "next"]);
    }

    #[test]
    fn storage_failure_is_swallowed() {
        let buffer = EventBuffer::new(Rc::new(FailingStorage));
        buffer.enqueue_event("x", Map::new());
        buffer.enqueue_page_view("/");
        buffer.clear_events();
        assert!(buffer.pending_events().is_empty());
    }
}
