//! The transport contract consumed by the storefront.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use storefront_core::{ChannelId, MessageId, UserId};

use crate::message::{IncomingMessage, OutgoingMessage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The platform refused the message (e.g. the user blocks private
    /// messages from people they do not share a friendship with).
    #[error("{0}")]
    Forbidden(String),

    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),

    #[error("transport closed")]
    Closed,

    #[error("transport error: {0}")]
    Other(String),
}

/// Chat platform operations the storefront relies on.
///
/// Implementations must be safe to share across tasks: each command runs on
/// its own task and may send concurrently with others.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post a message to a channel.
    async fn send(
        &self,
        channel: ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError>;

    /// Open (or reuse) the private channel with a user.
    async fn open_dm(&self, user: UserId) -> Result<ChannelId, TransportError>;

    /// Resolve a channel id to a destination the bot can post to.
    async fn resolve_channel(&self, channel: ChannelId) -> Result<ChannelId, TransportError>;

    /// Subscribe to incoming messages. Only messages received after the call
    /// are delivered to the returned receiver.
    fn subscribe(&self) -> broadcast::Receiver<IncomingMessage>;
}

/// Deliver a message to a user's private channel.
pub async fn send_private(
    transport: &dyn ChatTransport,
    user: UserId,
    message: OutgoingMessage,
) -> Result<MessageId, TransportError> {
    let dm = transport.open_dm(user).await?;
    transport.send(dm, message).await
}
