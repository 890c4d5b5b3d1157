use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{Scope, SettingsStore, StoreError};

/// On-disk layout of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    global: BTreeMap<String, JsonValue>,
    /// Guild id (decimal string) → key → value.
    #[serde(default)]
    guilds: BTreeMap<String, BTreeMap<String, JsonValue>>,
}

impl SettingsDocument {
    fn scope(&self, scope: Scope) -> Option<&BTreeMap<String, JsonValue>> {
        match scope {
            Scope::Global => Some(&self.global),
            Scope::Guild(id) => self.guilds.get(&id.to_string()),
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut BTreeMap<String, JsonValue> {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Guild(id) => self.guilds.entry(id.to_string()).or_default(),
        }
    }
}

/// Settings persisted as a single JSON document.
///
/// Every write serializes the whole document to a sibling temp file and
/// renames it over the original, so a crash leaves either the old or the new
/// document. The in-memory copy only changes once the write succeeded.
///
/// IO is synchronous and runs on the calling task while the document's write
/// lock is held. Writers are already serialized per guild by the caller and
/// the document is small, so a write blocks its worker for one `write` and
/// one `rename`. Readers of other guilds wait for that long too.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    document: RwLock<SettingsDocument>,
}

impl JsonFileSettingsStore {
    pub const FILE_NAME: &'static str = "settings.json";

    /// Open `<dir>/settings.json`, starting empty when the file is missing.
    pub fn open_in(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => SettingsDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsDocument::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), guilds = document.guilds.len(), "settings loaded");
        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, document: &SettingsDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut SettingsDocument),
    {
        let mut current = self.document.write().map_err(|_| StoreError::Poisoned)?;
        let mut next = current.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *current = next;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<JsonValue>, StoreError> {
        let document = self.document.read().map_err(|_| StoreError::Poisoned)?;
        Ok(document.scope(scope).and_then(|values| values.get(key)).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: JsonValue) -> Result<(), StoreError> {
        self.update(|document| {
            document.scope_mut(scope).insert(key.to_string(), value);
        })
    }
}
