use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::{Scope, SettingsStore, StoreError};

/// In-memory scoped settings store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    inner: RwLock<HashMap<(Scope, String), JsonValue>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<JsonValue>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(&(scope, key.to_string())).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: JsonValue) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        map.insert((scope, key.to_string()), value);
        Ok(())
    }
}
