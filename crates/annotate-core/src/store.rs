//! Persistence collaborator.
//!
//! Records are kept in a flat key-value space keyed by record id. Values are
//! the record's JSON. There is one writer (the UI thread), so stores need no
//! locking.

use std::collections::BTreeMap;

use crate::error::Result;

/// A string key-value store for serialized records.
pub trait AnnotationStore {
    /// All stored `(key, value)` pairs.
    fn entries(&self) -> Result<Vec<(String, String)>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn delete(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, ordered by key.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl AnnotationStore for MemoryStore {
    fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();
        store.set("a", "3").unwrap();
        assert_eq!(
            store.entries().unwrap(),
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
        store.delete("a").unwrap();
        store.delete("missing").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b"), Some("2"));
    }
}
