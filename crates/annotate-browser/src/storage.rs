//! LocalStorage persistence for annotation records.
//!
//! Values are the record JSON stored as-is, so entries written by older
//! builds of the page script load unchanged.

use annotate_core::{AnnotateError, AnnotationStore, Result};
use gloo_storage::{LocalStorage, Storage};
use smol_str::SmolStr;

/// `AnnotationStore` backed by `window.localStorage`.
///
/// Keys are namespaced by `prefix`. An empty prefix claims every key in the
/// origin's storage.
#[derive(Clone, Debug)]
pub struct LocalStore {
    prefix: SmolStr,
}

impl LocalStore {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Remove every entry under this store's prefix.
    pub fn clear(&mut self) -> Result<()> {
        for (key, _) in self.entries()? {
            self.delete(&key)?;
        }
        Ok(())
    }
}

fn raw_storage() -> Result<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
        .ok_or_else(|| AnnotateError::Storage("localStorage is unavailable".into()))
}

impl AnnotationStore for LocalStore {
    fn entries(&self) -> Result<Vec<(String, String)>> {
        // gloo_storage doesn't have a direct way to iterate keys,
        // so we use web_sys directly
        let storage = raw_storage()?;
        let len = storage
            .length()
            .map_err(|e| AnnotateError::Storage(format!("length failed: {:?}", e)))?;

        let mut entries = Vec::new();
        for i in 0..len {
            let Ok(Some(key)) = storage.key(i) else {
                continue;
            };
            let Some(record_key) = key.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            if let Ok(Some(value)) = storage.get_item(&key) {
                entries.push((record_key.to_string(), value));
            }
        }
        Ok(entries)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // Raw write: gloo's typed `set` would JSON-encode the string again.
        raw_storage()?
            .set_item(&self.storage_key(key), value)
            .map_err(|e| AnnotateError::Storage(format!("set_item failed: {:?}", e)))
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        LocalStorage::delete(self.storage_key(key));
        Ok(())
    }
}
