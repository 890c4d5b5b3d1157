//! Scoped key/value settings storage.
//!
//! The store itself is schemaless: whole JSON values under fixed string keys,
//! partitioned by [`Scope`]. [`GuildSettings`] and [`GlobalSettings`] layer
//! typed accessors (with registered defaults) on top.

mod in_memory;
mod json_file;
mod typed;

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

use storefront_core::GuildId;

pub use in_memory::InMemorySettingsStore;
pub use json_file::JsonFileSettingsStore;
pub use typed::{GlobalSettings, GuildSettings};

/// Setting keys.
pub mod keys {
    pub const STOCK: &str = "stock";
    pub const PURCHASE_HISTORY: &str = "purchase_history";
    pub const LOG_CHANNEL_ID: &str = "log_channel_id";
    pub const RESTRICTED_ROLES: &str = "restricted_roles";
    pub const GRANT_PERMISSIONS: &str = "grant_permissions";
    pub const RESTOCK_THRESHOLD: &str = "restock_threshold";
}

/// Partition of the settings store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Process-wide values.
    Global,
    /// Values private to one guild.
    Guild(GuildId),
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Guild(id) => write!(f, "guild:{id}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("setting `{key}` in {scope} is malformed: {reason}")]
    Malformed {
        scope: Scope,
        key: String,
        reason: String,
    },

    #[error("settings lock poisoned")]
    Poisoned,
}

/// Get-whole-value / set-whole-value storage keyed by `(scope, key)`.
pub trait SettingsStore: Send + Sync {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<JsonValue>, StoreError>;
    fn set(&self, scope: Scope, key: &str, value: JsonValue) -> Result<(), StoreError>;
}

impl<S> SettingsStore for Arc<S>
where
    S: SettingsStore + ?Sized,
{
    fn get(&self, scope: Scope, key: &str) -> Result<Option<JsonValue>, StoreError> {
        (**self).get(scope, key)
    }

    fn set(&self, scope: Scope, key: &str, value: JsonValue) -> Result<(), StoreError> {
        (**self).set(scope, key, value)
    }
}
