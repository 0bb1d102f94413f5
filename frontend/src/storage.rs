use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use web_sys::window;

use crate::error::StorageError;

/// String keyed persistence, shaped like `window.localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

pub struct BrowserStorage {
    storage: web_sys::Storage,
}

impl BrowserStorage {
    pub fn local() -> Result<Self, StorageError> {
        let storage = window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

fn js_error(err: wasm_bindgen::JsValue) -> StorageError {
    StorageError::Operation(format!("{:?}", err))
}

impl KeyValueStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

/// Fallback used when `localStorage` is blocked (private mode) and in tests.
#[derive(Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

pub fn open_storage() -> Rc<dyn KeyValueStore> {
    match BrowserStorage::local() {
        Ok(storage) => Rc::new(storage),
        Err(e) => {
            warn!("localStorage not usable ({}), keeping state in memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;

    use super::*;

    /// In-memory storage that refuses writes to one key, or every removal,
    /// the way a browser does once the quota is used up.
    #[derive(Default)]
    pub struct QuotaStorage {
        pub inner: MemoryStorage,
        full_key: Cell<Option<&'static str>>,
        removes_fail: Cell<bool>,
    }

    impl QuotaStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reject_writes_to(&self, key: &'static str) {
            self.full_key.set(Some(key));
        }

        pub fn fail_removes(&self) {
            self.removes_fail.set(true);
        }
    }

    impl KeyValueStore for QuotaStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.full_key.get() == Some(key) {
                return Err(StorageError::Operation("QuotaExceededError".into()));
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            if self.removes_fail.get() {
                return Err(StorageError::Operation("SecurityError".into()));
            }
            self.inner.remove_item(key)
        }
    }

    /// Storage whose every call fails, like a full quota.
    pub struct FailingStorage;

    impl KeyValueStore for FailingStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Operation("QuotaExceededError".into()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Operation("QuotaExceededError".into()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Operation("QuotaExceededError".into()))
        }
    }
}
