use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use storefront_auth::{AccessPolicy, RoleList};
use storefront_core::{ChannelId, GuildId};
use storefront_inventory::{StockEntry, StockTable};
use storefront_sales::PurchaseHistory;

use super::{Scope, SettingsStore, StoreError, keys};

fn read<T, S>(store: &S, scope: Scope, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: SettingsStore + ?Sized,
{
    match store.get(scope, key)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                scope,
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

fn write<T, S>(store: &S, scope: Scope, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: SettingsStore + ?Sized,
{
    store.set(scope, key, serde_json::to_value(value)?)
}

/// Typed view of one guild's settings.
#[derive(Debug)]
pub struct GuildSettings<'a, S: ?Sized> {
    store: &'a S,
    guild: GuildId,
}

impl<'a, S> GuildSettings<'a, S>
where
    S: SettingsStore + ?Sized,
{
    pub fn new(store: &'a S, guild: GuildId) -> Self {
        Self { store, guild }
    }

    fn scope(&self) -> Scope {
        Scope::Guild(self.guild)
    }

    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn stock(&self) -> Result<StockTable, StoreError> {
        let entries: BTreeMap<String, StockEntry> =
            read(self.store, self.scope(), keys::STOCK)?.unwrap_or_default();
        Ok(StockTable::from_entries(self.guild, entries))
    }

    pub fn set_stock(&self, table: &StockTable) -> Result<(), StoreError> {
        write(self.store, self.scope(), keys::STOCK, table.entries())
    }

    pub fn purchase_history(&self) -> Result<PurchaseHistory, StoreError> {
        Ok(read(self.store, self.scope(), keys::PURCHASE_HISTORY)?.unwrap_or_default())
    }

    pub fn set_purchase_history(&self, history: &PurchaseHistory) -> Result<(), StoreError> {
        write(self.store, self.scope(), keys::PURCHASE_HISTORY, history)
    }

    pub fn log_channel(&self) -> Result<Option<ChannelId>, StoreError> {
        read(self.store, self.scope(), keys::LOG_CHANNEL_ID)
    }

    pub fn set_log_channel(&self, channel: ChannelId) -> Result<(), StoreError> {
        write(self.store, self.scope(), keys::LOG_CHANNEL_ID, &channel)
    }

    pub fn restricted_roles(&self) -> Result<RoleList, StoreError> {
        Ok(read(self.store, self.scope(), keys::RESTRICTED_ROLES)?.unwrap_or_default())
    }

    pub fn set_restricted_roles(&self, roles: &RoleList) -> Result<(), StoreError> {
        write(self.store, self.scope(), keys::RESTRICTED_ROLES, roles)
    }

    pub fn grant_roles(&self) -> Result<RoleList, StoreError> {
        Ok(read(self.store, self.scope(), keys::GRANT_PERMISSIONS)?.unwrap_or_default())
    }

    pub fn set_grant_roles(&self, roles: &RoleList) -> Result<(), StoreError> {
        write(self.store, self.scope(), keys::GRANT_PERMISSIONS, roles)
    }

    pub fn access_policy(&self) -> Result<AccessPolicy, StoreError> {
        Ok(AccessPolicy {
            restricted_roles: self.restricted_roles()?,
            grant_roles: self.grant_roles()?,
        })
    }
}

/// Typed view of process-wide settings.
#[derive(Debug)]
pub struct GlobalSettings<'a, S: ?Sized> {
    store: &'a S,
    default_restock_threshold: u32,
}

impl<'a, S> GlobalSettings<'a, S>
where
    S: SettingsStore + ?Sized,
{
    pub fn new(store: &'a S, default_restock_threshold: u32) -> Self {
        Self {
            store,
            default_restock_threshold,
        }
    }

    pub fn restock_threshold(&self) -> Result<u32, StoreError> {
        Ok(read(self.store, Scope::Global, keys::RESTOCK_THRESHOLD)?
            .unwrap_or(self.default_restock_threshold))
    }

    pub fn set_restock_threshold(&self, threshold: u32) -> Result<(), StoreError> {
        write(self.store, Scope::Global, keys::RESTOCK_THRESHOLD, &threshold)
    }
}
