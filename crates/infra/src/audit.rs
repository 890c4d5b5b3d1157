//! Best-effort audit log routed to each guild's configured log channel.
//!
//! Nothing here fails the calling command: an unset channel is skipped
//! silently, an unreachable channel or a failed send is only traced.

use std::sync::Arc;

use storefront_chat::{ChatTransport, Colour, Embed, OutgoingMessage};
use storefront_core::{ChannelId, Clock, GuildId};

use crate::store::{GuildSettings, SettingsStore};

pub struct AuditLog {
    store: Arc<dyn SettingsStore>,
    transport: Arc<dyn ChatTransport>,
    clock: Arc<dyn Clock>,
}

impl AuditLog {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        transport: Arc<dyn ChatTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
        }
    }

    /// Post an "Event Log" entry on behalf of `actor`.
    pub async fn record(&self, guild: GuildId, actor: &str, message: &str) {
        let embed = Embed::new("Event Log", Colour::Orange)
            .description(message)
            .footer(format!("Logged by {actor}"))
            .timestamp(self.clock.now());
        self.post(guild, embed).await;
    }

    /// Post a "Stock Alert" for a product at or below the restock threshold.
    pub async fn low_stock(&self, guild: GuildId, product: &str, quantity: u32) {
        let embed = Embed::new("Stock Alert", Colour::Red)
            .description(format!(
                "The stock for `{product}` is running low. Current quantity: {quantity}."
            ))
            .timestamp(self.clock.now());
        self.post(guild, embed).await;
    }

    async fn post(&self, guild: GuildId, embed: Embed) {
        let Some(channel) = self.destination(guild).await else {
            return;
        };
        if let Err(e) = self.transport.send(channel, OutgoingMessage::embed(embed)).await {
            tracing::warn!(%guild, %channel, error = %e, "failed to write audit log entry");
        }
    }

    async fn destination(&self, guild: GuildId) -> Option<ChannelId> {
        let configured = match GuildSettings::new(self.store.as_ref(), guild).log_channel() {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                tracing::debug!(%guild, "no log channel configured; audit entry skipped");
                return None;
            }
            Err(e) => {
                tracing::warn!(%guild, error = %e, "could not read log channel setting");
                return None;
            }
        };

        match self.transport.resolve_channel(configured).await {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::warn!(%guild, channel = %configured, error = %e, "log channel unreachable");
                None
            }
        }
    }
}
