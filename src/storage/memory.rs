use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        RwLock,
    },
};

use crate::errors::{QuoteError, Result};

use super::KeyValueStore;

/// In-process store used by tests and embedders that do not need durability.
///
/// Writes can be made to fail on demand to exercise rollback paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Makes every following `write` fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| QuoteError::Persistence("memory store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(QuoteError::Persistence("storage quota exceeded".into()));
        }
        let mut values = self
            .values
            .write()
            .map_err(|_| QuoteError::Persistence("memory store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_writes_leave_values_untouched() {
        let store = MemoryStore::with_value("quotes", "[]");
        store.set_fail_writes(true);
        assert!(store.write("quotes", "[1]").is_err());
        assert_eq!(store.raw("quotes").as_deref(), Some("[]"));
        assert_eq!(store.write_count(), 0);
    }
}
