//! In-memory transport for tests/dev.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast};

use storefront_core::{ChannelId, MessageId, UserId};

use crate::message::{IncomingMessage, OutgoingMessage};
use crate::transport::{ChatTransport, TransportError};

/// Private channel ids are allocated from here so they never collide with
/// the guild channels a test registers.
const DM_CHANNEL_BASE: u64 = 9_000_000_000_000_000_000;

/// Reason reported when a user refuses private messages.
pub const DM_REFUSED_REASON: &str =
    "403 Forbidden (error code: 50007): Cannot send messages to this user";

/// A message recorded by [`InMemoryTransport::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub message: OutgoingMessage,
}

#[derive(Debug, Default)]
struct State {
    channels: HashSet<ChannelId>,
    dm_channels: HashMap<UserId, ChannelId>,
    dm_blocked: HashSet<UserId>,
    sent: Vec<SentMessage>,
    next_message_id: u64,
}

/// Transport that records everything it sends.
///
/// - No IO
/// - Incoming messages are injected by the test via [`InMemoryTransport::inject`]
/// - Users can be marked as refusing private messages
#[derive(Debug)]
pub struct InMemoryTransport {
    incoming: broadcast::Sender<IncomingMessage>,
    state: Mutex<State>,
    sent_notify: Notify,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        let (incoming, _) = broadcast::channel(256);
        Self {
            incoming,
            state: Mutex::new(State::default()),
            sent_notify: Notify::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make a guild channel known (sendable).
    pub fn register_channel(&self, channel: ChannelId) {
        self.state().channels.insert(channel);
    }

    /// Make `user` refuse private messages.
    pub fn block_dms(&self, user: UserId) {
        self.state().dm_blocked.insert(user);
    }

    /// Publish an incoming message to all subscribers. Returns the number of
    /// subscribers that received it.
    pub fn inject(&self, message: IncomingMessage) -> usize {
        self.incoming.send(message).unwrap_or(0)
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state().sent.clone()
    }

    pub fn sent_to(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.state()
            .sent
            .iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.message.clone())
            .collect()
    }

    /// Private channel opened for `user`, if any.
    pub fn dm_channel_of(&self, user: UserId) -> Option<ChannelId> {
        self.state().dm_channels.get(&user).copied()
    }

    /// Wait until a sent message satisfies `predicate` (including messages
    /// sent before the call).
    pub async fn wait_for_sent<F>(&self, predicate: F) -> SentMessage
    where
        F: Fn(&SentMessage) -> bool,
    {
        loop {
            let notified = self.sent_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(found) = self.state().sent.iter().find(|m| predicate(m)).cloned() {
                return found;
            }
            notified.await;
        }
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for InMemoryTransport {
    async fn send(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        let id = {
            let mut state = self.state();
            if !state.channels.contains(&channel) {
                return Err(TransportError::UnknownChannel(channel));
            }
            let blocked = state
                .dm_channels
                .iter()
                .any(|(user, dm)| *dm == channel && state.dm_blocked.contains(user));
            if blocked {
                return Err(TransportError::Forbidden(DM_REFUSED_REASON.to_string()));
            }

            state.next_message_id += 1;
            let id = MessageId::new(state.next_message_id);
            state.sent.push(SentMessage {
                id,
                channel,
                message,
            });
            id
        };
        self.sent_notify.notify_waiters();
        Ok(id)
    }

    async fn open_dm(&self, user: UserId) -> Result<ChannelId, TransportError> {
        let mut state = self.state();
        if let Some(existing) = state.dm_channels.get(&user) {
            return Ok(*existing);
        }
        let channel = ChannelId::new(DM_CHANNEL_BASE + state.dm_channels.len() as u64);
        state.dm_channels.insert(user, channel);
        state.channels.insert(channel);
        Ok(channel)
    }

    async fn resolve_channel(&self, channel: ChannelId) -> Result<ChannelId, TransportError> {
        if self.state().channels.contains(&channel) {
            Ok(channel)
        } else {
            Err(TransportError::UnknownChannel(channel))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<IncomingMessage> {
        self.incoming.subscribe()
    }
}
