//! Infrastructure layer: settings storage, scope locking, audit log, config.

pub mod audit;
pub mod config;
pub mod locks;
pub mod store;

pub use audit::AuditLog;
pub use config::{ConfigError, StorefrontConfig};
pub use locks::ScopeLocks;
pub use store::{
    GlobalSettings, GuildSettings, InMemorySettingsStore, JsonFileSettingsStore, Scope,
    SettingsStore, StoreError,
};
