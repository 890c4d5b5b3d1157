#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{TimeZone, Utc};
use tokio::task::JoinHandle;

use storefront_bot::{Manager, workflow::VOUCH_PROMPT};
use storefront_chat::{Author, Embed, IncomingMessage, InMemoryTransport, OutgoingMessage};
use storefront_core::{ChannelId, FixedClock, GuildId, MessageId, Money, RoleId, UserId};
use storefront_infra::{GuildSettings, InMemorySettingsStore, SettingsStore, StorefrontConfig};
use storefront_inventory::{StockEntry, StockTable};

pub const GUILD: GuildId = GuildId::new(911);
pub const SHOP: ChannelId = ChannelId::new(100);
pub const BACKROOM: ChannelId = ChannelId::new(101);
pub const LOG: ChannelId = ChannelId::new(200);
pub const OPERATOR: UserId = UserId::new(1);
pub const SECOND_OPERATOR: UserId = UserId::new(2);
pub const BUYER: UserId = UserId::new(42);
pub const SELLER_ROLE: RoleId = RoleId::new(300);

/// 2024-08-01 18:45:00 UTC, rendered in IST.
pub const NOW_LOCAL: &str = "2024-08-02 00:15:00";

pub struct Harness<S: SettingsStore + 'static = InMemorySettingsStore> {
    pub store: Arc<S>,
    pub transport: Arc<InMemoryTransport>,
    pub manager: Arc<Manager>,
    next_message_id: AtomicU64,
}

impl Harness<InMemorySettingsStore> {
    pub fn new() -> Self {
        Self::with_store(InMemorySettingsStore::new(), StorefrontConfig::default())
    }

    pub fn with_config(config: StorefrontConfig) -> Self {
        Self::with_store(InMemorySettingsStore::new(), config)
    }
}

impl<S: SettingsStore + 'static> Harness<S> {
    pub fn with_store(store: S, config: StorefrontConfig) -> Self {
        let store = Arc::new(store);
        let transport = Arc::new(InMemoryTransport::new());
        for channel in [SHOP, BACKROOM, LOG] {
            transport.register_channel(channel);
        }
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 8, 1, 18, 45, 0).unwrap(),
        ));
        let manager = Arc::new(Manager::new(
            store.clone(),
            transport.clone(),
            clock,
            config,
        ));
        Self {
            store,
            transport,
            manager,
            next_message_id: AtomicU64::new(1),
        }
    }

    pub fn settings(&self) -> GuildSettings<'_, S> {
        GuildSettings::new(self.store.as_ref(), GUILD)
    }

    pub fn seed_stock(&self, product: &str, quantity: u32, price: &str) {
        let settings = self.settings();
        let mut entries = settings.stock().unwrap().into_entries();
        entries.insert(
            product.to_string(),
            StockEntry::new(quantity, Money::parse(price).unwrap()).with_emoji("🎬"),
        );
        settings
            .set_stock(&StockTable::from_entries(GUILD, entries))
            .unwrap();
    }

    pub fn use_log_channel(&self) {
        self.settings().set_log_channel(LOG).unwrap();
    }

    pub fn message(&self, author: Author, channel: ChannelId, content: &str) -> IncomingMessage {
        IncomingMessage {
            id: MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed)),
            guild_id: Some(GUILD),
            channel_id: channel,
            author,
            content: content.to_string(),
        }
    }

    /// Run a command to completion as the default operator in the shop.
    pub async fn run(&self, content: &str) {
        self.run_as(operator(), SHOP, content).await;
    }

    pub async fn run_as(&self, author: Author, channel: ChannelId, content: &str) {
        self.manager.handle(self.message(author, channel, content)).await;
    }

    /// Start a command on its own task, for commands that wait for a reply.
    pub fn spawn_as(&self, author: Author, channel: ChannelId, content: &str) -> JoinHandle<()> {
        let manager = self.manager.clone();
        let message = self.message(author, channel, content);
        tokio::spawn(async move { manager.handle(message).await })
    }

    pub fn spawn(&self, content: &str) -> JoinHandle<()> {
        self.spawn_as(operator(), SHOP, content)
    }

    pub async fn await_prompt(&self, channel: ChannelId) {
        self.transport
            .wait_for_sent(|sent| {
                sent.channel == channel && sent.message.content.as_deref() == Some(VOUCH_PROMPT)
            })
            .await;
    }

    /// Answer the vouch prompt in `channel`.
    pub fn reply_as(&self, author: Author, channel: ChannelId, content: &str) {
        let delivered = self.transport.inject(self.message(author, channel, content));
        assert!(delivered > 0, "nobody was waiting for a reply");
    }

    pub fn texts(&self, channel: ChannelId) -> Vec<String> {
        self.transport
            .sent_to(channel)
            .into_iter()
            .filter_map(|message| message.content)
            .collect()
    }

    pub fn last_text(&self, channel: ChannelId) -> Option<String> {
        self.texts(channel).pop()
    }

    pub fn embeds(&self, channel: ChannelId) -> Vec<Embed> {
        self.transport
            .sent_to(channel)
            .into_iter()
            .filter_map(|message: OutgoingMessage| message.embed)
            .collect()
    }

    pub fn dm_embeds(&self, user: UserId) -> Vec<Embed> {
        match self.transport.dm_channel_of(user) {
            Some(dm) => self.embeds(dm),
            None => Vec::new(),
        }
    }

    pub fn quantity(&self, product: &str) -> Option<u32> {
        self.settings()
            .stock()
            .unwrap()
            .get(product)
            .map(|entry| entry.quantity)
    }
}

pub fn operator() -> Author {
    Author::new(OPERATOR, "operator")
}

pub fn second_operator() -> Author {
    Author::new(SECOND_OPERATOR, "closer")
}

pub fn member(id: u64, roles: &[RoleId]) -> Author {
    let mut author = Author::new(UserId::new(id), "member");
    author.roles = roles.to_vec();
    author
}

pub fn admin() -> Author {
    let mut author = Author::new(UserId::new(99), "admin");
    author.administrator = true;
    author
}
