//! Browser LocalStorage backend for [`ConfigStore`]

use crate::persistence::ConfigStore;

/// Prefix keeping our entries apart from anything else on the origin
const KEY_PREFIX: &str = "zipbeat.";

pub struct LocalStorageStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageStore {
    /// Grab the window's LocalStorage. Without one (private mode, no window)
    /// reads return nothing and saves are dropped.
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, settings will not persist");
        }
        Self { storage }
    }
}

impl ConfigStore for LocalStorageStore {
    fn read(&self, key: &str) -> Option<String> {
        let storage = self.storage.as_ref()?;
        storage.get_item(&format!("{}{}", KEY_PREFIX, key)).ok().flatten()
    }

    fn save(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            if storage.set_item(&format!("{}{}", KEY_PREFIX, key), value).is_err() {
                log::warn!("Failed to save '{}' to LocalStorage", key);
            }
        }
    }
}
