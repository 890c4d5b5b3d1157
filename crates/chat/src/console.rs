//! Line-oriented transport for running the storefront from a terminal.
//!
//! Every stdin line becomes a message from a single configured operator in a
//! single guild channel. Everything the bot sends is printed to stdout,
//! prefixed with its destination.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, broadcast};

use storefront_core::{ChannelId, GuildId, MessageId, UserId};

use crate::message::{Author, IncomingMessage, OutgoingMessage};
use crate::transport::{ChatTransport, TransportError};

const DM_CHANNEL_BASE: u64 = 8_000_000_000_000_000_000;

#[derive(Debug)]
pub struct ConsoleTransport {
    incoming: broadcast::Sender<IncomingMessage>,
    dm_channels: Mutex<HashMap<UserId, ChannelId>>,
    next_message_id: AtomicU64,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        let (incoming, _) = broadcast::channel(64);
        Self {
            incoming,
            dm_channels: Mutex::new(HashMap::new()),
            next_message_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> MessageId {
        MessageId::new(self.next_message_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Read stdin until EOF, publishing each non-empty line as a message from
    /// `author` in `channel`.
    pub async fn read_stdin(
        &self,
        guild: GuildId,
        channel: ChannelId,
        author: Author,
    ) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let message = IncomingMessage {
                id: self.next_id(),
                guild_id: Some(guild),
                channel_id: channel,
                author: author.clone(),
                content: line,
            };
            if self.incoming.send(message).is_err() {
                tracing::warn!("no subscriber for console input");
            }
        }
        Ok(())
    }

    async fn dm_owner(&self, channel: ChannelId) -> Option<UserId> {
        self.dm_channels
            .lock()
            .await
            .iter()
            .find(|(_, dm)| **dm == channel)
            .map(|(user, _)| *user)
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        let destination = match self.dm_owner(channel).await {
            Some(user) => format!("DM {}", user.mention()),
            None => channel.mention(),
        };
        let text = format!("[{destination}] {}\n", message.render_plain());

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(text.as_bytes())
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(self.next_id())
    }

    async fn open_dm(&self, user: UserId) -> Result<ChannelId, TransportError> {
        let mut channels = self.dm_channels.lock().await;
        let next = DM_CHANNEL_BASE + channels.len() as u64;
        Ok(*channels.entry(user).or_insert(ChannelId::new(next)))
    }

    async fn resolve_channel(&self, channel: ChannelId) -> Result<ChannelId, TransportError> {
        Ok(channel)
    }

    fn subscribe(&self) -> broadcast::Receiver<IncomingMessage> {
        self.incoming.subscribe()
    }
}
