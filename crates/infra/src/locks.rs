//! Per-guild serialization of settings read-modify-write cycles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use storefront_core::GuildId;

/// One async mutex per guild. Holding the guard means no other command of
/// the same guild is between reading and writing its settings.
#[derive(Debug, Default)]
pub struct ScopeLocks {
    locks: Mutex<HashMap<GuildId, Arc<AsyncMutex<()>>>>,
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, guild: GuildId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(guild).or_default().clone()
        };
        lock.lock_owned().await
    }
}
