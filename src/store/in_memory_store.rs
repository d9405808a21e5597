use crate::store::KeyValueStore;
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

/// Process-local store. Clones share the same map, which is how a "reload"
/// sees what the previous session wrote.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| eyre!("in-memory store lock poisoned"))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.lock()?;
        Ok(guard.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.lock()?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool> {
        let guard = self.lock()?;
        Ok(guard.contains_key(key))
    }

    fn set_if_absent(&mut self, key: &str, value: &str) -> Result<String> {
        let mut guard = self.lock()?;
        Ok(guard
            .entry(key.to_string())
            .or_insert_with(|| value.to_string())
            .clone())
    }
}
