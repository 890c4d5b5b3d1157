//! The storefront cog.
//!
//! [`Manager`] owns the injected collaborators, turns incoming messages into
//! commands and runs them. Every read-modify-write of a guild's settings
//! happens under that guild's [`ScopeLocks`] entry.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use storefront_auth::RoleList;
use storefront_chat::{ChatTransport, Embed, IncomingMessage, OutgoingMessage};
use storefront_core::{Aggregate, AggregateRoot, ChannelId, Clock, GuildId, RoleId, UserId};
use storefront_infra::{
    AuditLog, GlobalSettings, GuildSettings, ScopeLocks, SettingsStore, StorefrontConfig,
};
use storefront_inventory::{AddProduct, RemoveProduct, StockCommand, StockEvent, UpdatePrice};

use crate::authz::authorize_command;
use crate::commands::{self, Args, Command, CommandKind};
use crate::context::CommandContext;
use crate::embeds;
use crate::error::CommandError;
use crate::workflow::{self, DeliveryOutcome, DeliveryRequest};

#[derive(Debug, Clone, Copy)]
enum RoleListKind {
    Restricted,
    Grant,
}

pub struct Manager {
    pub(crate) store: Arc<dyn SettingsStore>,
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: StorefrontConfig,
    pub(crate) locks: ScopeLocks,
    pub(crate) audit: AuditLog,
}

impl Manager {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        transport: Arc<dyn ChatTransport>,
        clock: Arc<dyn Clock>,
        config: StorefrontConfig,
    ) -> Self {
        let audit = AuditLog::new(store.clone(), transport.clone(), clock.clone());
        Self {
            store,
            transport,
            clock,
            config,
            locks: ScopeLocks::new(),
            audit,
        }
    }

    /// Consume the transport's message stream until it closes, handling each
    /// message on its own task.
    pub async fn run(self: Arc<Self>) {
        let mut incoming = self.transport.subscribe();
        tracing::info!(prefix = %self.config.prefix, "storefront listening for commands");
        loop {
            match incoming.recv().await {
                Ok(message) => {
                    let manager = Arc::clone(&self);
                    tokio::spawn(async move { manager.handle(message).await });
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "command stream lagged; messages dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("message stream closed; storefront stopping");
                    break;
                }
            }
        }
    }

    /// Handle one incoming message. Messages that are not storefront commands
    /// are ignored; every failure ends in a reply to the invoking channel.
    pub async fn handle(&self, message: IncomingMessage) {
        if message.author.bot {
            return;
        }
        let Some((kind, args)) = commands::split(&self.config.prefix, &message.content) else {
            return;
        };

        tracing::debug!(command = kind.name(), author = %message.author.id, "command received");
        if let Err(err) = self.dispatch(&message, kind, args).await {
            self.report(message.channel_id, kind, &err).await;
        }
    }

    async fn dispatch(
        &self,
        message: &IncomingMessage,
        kind: CommandKind,
        args: Args<'_>,
    ) -> Result<(), CommandError> {
        let ctx = CommandContext::from_message(message)?;
        self.guard(&ctx, kind)?;
        let command =
            Command::parse(kind, args).map_err(|e| CommandError::usage(&self.config.prefix, e))?;
        self.run_command(&ctx, command).await
    }

    /// Authorize and run `deliver`, returning its outcome.
    pub async fn deliver(&self, ctx: &CommandContext, request: DeliveryRequest) -> DeliveryOutcome {
        self.guard(ctx, CommandKind::Deliver)?;
        workflow::delivery::run(self, ctx, request).await
    }

    fn guard(&self, ctx: &CommandContext, kind: CommandKind) -> Result<(), CommandError> {
        let policy = GuildSettings::new(self.store.as_ref(), ctx.guild_id()).access_policy()?;
        authorize_command(ctx, &policy, &kind).map_err(|_| CommandError::Forbidden(kind))
    }

    async fn run_command(&self, ctx: &CommandContext, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Deliver(request) => workflow::delivery::run(self, ctx, request).await.map(|_| ()),
            Command::Stock => self.stock(ctx).await,
            Command::AddProduct(cmd) => self.add_product(ctx, cmd).await,
            Command::RemoveProduct(cmd) => self.remove_product(ctx, cmd).await,
            Command::UpdatePrice(cmd) => self.update_price(ctx, cmd).await,
            Command::ViewHistory { member } => self.view_history(ctx, member).await,
            Command::SetLogChannel { channel } => self.set_log_channel(ctx, channel).await,
            Command::RestrictRole { role } => self.restrict_role(ctx, role).await,
            Command::UnrestrictRole { role } => self.unrestrict_role(ctx, role).await,
            Command::GrantPermissions { role } => self.grant_permissions(ctx, role).await,
            Command::RevokePermissions { role } => self.revoke_permissions(ctx, role).await,
            Command::SetRestockThreshold { threshold } => {
                self.set_restock_threshold(ctx, threshold).await
            }
        }
    }

    fn settings(&self, guild: GuildId) -> GuildSettings<'_, dyn SettingsStore> {
        GuildSettings::new(self.store.as_ref(), guild)
    }

    /// Apply a stock command under the guild lock and persist the result.
    async fn mutate_stock(
        &self,
        guild: GuildId,
        command: StockCommand,
    ) -> Result<Vec<StockEvent>, CommandError> {
        let _guard = self.locks.lock(guild).await;
        let settings = self.settings(guild);
        let mut stock = settings.stock()?;
        let events = stock.execute(&command)?;
        settings.set_stock(&stock)?;
        tracing::debug!(%guild, version = stock.version(), "stock table written");
        Ok(events)
    }

    async fn stock(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let table = self.settings(ctx.guild_id()).stock()?;
        match embeds::stock_list(&table, self.config.exchange_rate) {
            Some(embed) => self.reply_embed(ctx.channel_id(), embed).await,
            None => self.reply_text(ctx.channel_id(), "No stock available.").await,
        }
        Ok(())
    }

    async fn add_product(&self, ctx: &CommandContext, cmd: AddProduct) -> Result<(), CommandError> {
        let guild = ctx.guild_id();
        let events = self
            .mutate_stock(guild, StockCommand::AddProduct(cmd.clone()))
            .await?;
        let restocked = events.iter().any(|event| {
            matches!(event, StockEvent::ProductStocked(stocked) if stocked.restocked)
        });
        tracing::info!(%guild, product = %cmd.product, quantity = cmd.quantity, restocked, "product stocked");

        let rate = self.config.exchange_rate;
        let embed = embeds::product_added(
            &cmd.product,
            cmd.emoji.as_deref().unwrap_or(""),
            cmd.quantity,
            cmd.price,
            rate,
        );
        self.reply_embed(ctx.channel_id(), embed).await;
        self.audit
            .record(
                guild,
                &ctx.invoker().name,
                &format!(
                    "Added {}x {} to the stock at {}",
                    cmd.quantity,
                    cmd.product,
                    rate.dual(cmd.price)
                ),
            )
            .await;
        Ok(())
    }

    async fn remove_product(
        &self,
        ctx: &CommandContext,
        cmd: RemoveProduct,
    ) -> Result<(), CommandError> {
        let guild = ctx.guild_id();
        self.mutate_stock(guild, StockCommand::RemoveProduct(cmd.clone()))
            .await?;
        tracing::info!(%guild, product = %cmd.product, "product removed");

        self.reply_embed(ctx.channel_id(), embeds::product_removed(&cmd.product))
            .await;
        self.audit
            .record(
                guild,
                &ctx.invoker().name,
                &format!("Removed {} from the stock", cmd.product),
            )
            .await;
        Ok(())
    }

    async fn update_price(&self, ctx: &CommandContext, cmd: UpdatePrice) -> Result<(), CommandError> {
        let guild = ctx.guild_id();
        let events = self
            .mutate_stock(guild, StockCommand::UpdatePrice(cmd.clone()))
            .await?;
        let old_price = events
            .iter()
            .find_map(|event| match event {
                StockEvent::PriceUpdated(updated) => Some(updated.old_price),
                _ => None,
            })
            .unwrap_or(cmd.price);
        tracing::info!(%guild, product = %cmd.product, old = %old_price, new = %cmd.price, "price updated");

        let rate = self.config.exchange_rate;
        self.reply_embed(
            ctx.channel_id(),
            embeds::price_updated(&cmd.product, old_price, cmd.price, rate),
        )
        .await;
        self.audit
            .record(
                guild,
                &ctx.invoker().name,
                &format!(
                    "Updated the price of {} from {} to {}",
                    cmd.product,
                    rate.dual(old_price),
                    rate.dual(cmd.price)
                ),
            )
            .await;
        Ok(())
    }

    async fn view_history(
        &self,
        ctx: &CommandContext,
        member: Option<UserId>,
    ) -> Result<(), CommandError> {
        let member = member.unwrap_or(ctx.invoker().user_id);
        let history = self.settings(ctx.guild_id()).purchase_history()?;
        let records = history.for_buyer(member);

        if records.is_empty() {
            self.reply_text(
                ctx.channel_id(),
                format!("No purchase history found for {}.", member.mention()),
            )
            .await;
        } else {
            self.reply_embed(ctx.channel_id(), embeds::purchase_history(member, records))
                .await;
        }
        Ok(())
    }

    async fn set_log_channel(
        &self,
        ctx: &CommandContext,
        channel: ChannelId,
    ) -> Result<(), CommandError> {
        let resolved = self
            .transport
            .resolve_channel(channel)
            .await
            .map_err(|_| CommandError::ChannelUnreachable(channel))?;
        {
            let _guard = self.locks.lock(ctx.guild_id()).await;
            self.settings(ctx.guild_id()).set_log_channel(resolved)?;
        }
        tracing::info!(guild = %ctx.guild_id(), channel = %resolved, "log channel set");

        self.reply_text(
            ctx.channel_id(),
            format!("Log channel set to {}.", resolved.mention()),
        )
        .await;
        Ok(())
    }

    /// Read, edit and write one of the guild's role lists under its lock.
    /// The list is only written when `edit` reports a change.
    async fn edit_roles(
        &self,
        guild: GuildId,
        list: RoleListKind,
        edit: impl FnOnce(&mut RoleList) -> bool,
    ) -> Result<bool, CommandError> {
        let _guard = self.locks.lock(guild).await;
        let settings = self.settings(guild);
        let mut roles = match list {
            RoleListKind::Restricted => settings.restricted_roles()?,
            RoleListKind::Grant => settings.grant_roles()?,
        };
        let changed = edit(&mut roles);
        if changed {
            match list {
                RoleListKind::Restricted => settings.set_restricted_roles(&roles)?,
                RoleListKind::Grant => settings.set_grant_roles(&roles)?,
            }
        }
        Ok(changed)
    }

    async fn restrict_role(&self, ctx: &CommandContext, role: RoleId) -> Result<(), CommandError> {
        let added = self
            .edit_roles(ctx.guild_id(), RoleListKind::Restricted, |roles| roles.insert(role))
            .await?;

        let reply = if added {
            tracing::info!(guild = %ctx.guild_id(), %role, "role added to restriction list");
            format!("Role {} has been added to the restriction list.", role.mention())
        } else {
            format!("Role {} is already restricted.", role.mention())
        };
        self.reply_text(ctx.channel_id(), reply).await;
        Ok(())
    }

    async fn unrestrict_role(&self, ctx: &CommandContext, role: RoleId) -> Result<(), CommandError> {
        let removed = self
            .edit_roles(ctx.guild_id(), RoleListKind::Restricted, |roles| roles.remove(role))
            .await?;

        let reply = if removed {
            tracing::info!(guild = %ctx.guild_id(), %role, "role removed from restriction list");
            format!("Role {} has been removed from the restriction list.", role.mention())
        } else {
            format!("Role {} is not restricted.", role.mention())
        };
        self.reply_text(ctx.channel_id(), reply).await;
        Ok(())
    }

    async fn grant_permissions(
        &self,
        ctx: &CommandContext,
        role: RoleId,
    ) -> Result<(), CommandError> {
        let added = self
            .edit_roles(ctx.guild_id(), RoleListKind::Grant, |roles| roles.insert(role))
            .await?;

        let reply = if added {
            tracing::info!(guild = %ctx.guild_id(), %role, "role granted settings permissions");
            format!("Role {} has been granted special permissions.", role.mention())
        } else {
            format!("Role {} already has special permissions.", role.mention())
        };
        self.reply_text(ctx.channel_id(), reply).await;
        Ok(())
    }

    async fn revoke_permissions(
        &self,
        ctx: &CommandContext,
        role: RoleId,
    ) -> Result<(), CommandError> {
        let removed = self
            .edit_roles(ctx.guild_id(), RoleListKind::Grant, |roles| roles.remove(role))
            .await?;

        let reply = if removed {
            tracing::info!(guild = %ctx.guild_id(), %role, "role lost settings permissions");
            format!("Role {} no longer has special permissions.", role.mention())
        } else {
            format!("Role {} does not have special permissions.", role.mention())
        };
        self.reply_text(ctx.channel_id(), reply).await;
        Ok(())
    }

    async fn set_restock_threshold(
        &self,
        ctx: &CommandContext,
        threshold: u32,
    ) -> Result<(), CommandError> {
        GlobalSettings::new(self.store.as_ref(), self.config.restock_threshold)
            .set_restock_threshold(threshold)?;
        tracing::info!(threshold, "restock threshold set");

        self.reply_text(
            ctx.channel_id(),
            format!("Restock threshold set to {threshold}."),
        )
        .await;
        Ok(())
    }

    /// Post a stock alert when `remaining` is at or below the restock
    /// threshold.
    pub(crate) async fn alert_if_low(&self, guild: GuildId, product: &str, remaining: u32) {
        let threshold = match GlobalSettings::new(self.store.as_ref(), self.config.restock_threshold)
            .restock_threshold()
        {
            Ok(threshold) => threshold,
            Err(e) => {
                tracing::warn!(%guild, error = %e, "could not read restock threshold");
                return;
            }
        };
        if remaining <= threshold {
            tracing::info!(%guild, product, remaining, threshold, "stock at or below threshold");
            self.audit.low_stock(guild, product, remaining).await;
        }
    }

    async fn report(&self, channel: ChannelId, kind: CommandKind, err: &CommandError) {
        if err.is_user_error() {
            tracing::debug!(command = kind.name(), error = %err, "command rejected");
        } else {
            tracing::error!(command = kind.name(), error = ?err, "command failed");
        }
        self.reply_text(channel, err.to_string()).await;
    }

    pub(crate) async fn reply_text(&self, channel: ChannelId, text: impl Into<String>) {
        self.reply(channel, OutgoingMessage::text(text)).await;
    }

    async fn reply_embed(&self, channel: ChannelId, embed: Embed) {
        self.reply(channel, OutgoingMessage::embed(embed)).await;
    }

    async fn reply(&self, channel: ChannelId, message: OutgoingMessage) {
        if let Err(e) = self.transport.send(channel, message).await {
            tracing::warn!(%channel, error = %e, "failed to send reply");
        }
    }
}
