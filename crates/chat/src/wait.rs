//! Deadline-bounded wait for a follow-up message.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use storefront_core::{ChannelId, UserId};

use crate::message::IncomingMessage;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("no reply before the deadline")]
    Timeout,

    #[error("message stream closed")]
    Closed,
}

/// Accepts only messages from one author in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyFilter {
    pub author: UserId,
    pub channel: ChannelId,
}

impl ReplyFilter {
    pub fn matches(&self, message: &IncomingMessage) -> bool {
        message.author.id == self.author && message.channel_id == self.channel
    }
}

/// Waits for the next message passing a [`ReplyFilter`], up to a deadline.
///
/// Create the waiter *before* prompting so a fast reply is not missed. The
/// wait is cancelled by dropping the future returned from [`ReplyWaiter::wait`].
#[derive(Debug)]
pub struct ReplyWaiter {
    receiver: broadcast::Receiver<IncomingMessage>,
    filter: ReplyFilter,
    deadline: Instant,
}

impl ReplyWaiter {
    pub fn new(
        receiver: broadcast::Receiver<IncomingMessage>,
        filter: ReplyFilter,
        timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            filter,
            deadline: Instant::now() + timeout,
        }
    }

    pub async fn wait(mut self) -> Result<IncomingMessage, WaitError> {
        let filter = self.filter;
        let receiver = &mut self.receiver;
        match tokio::time::timeout_at(self.deadline, next_match(receiver, filter)).await {
            Ok(result) => result,
            Err(_) => Err(WaitError::Timeout),
        }
    }
}

async fn next_match(
    receiver: &mut broadcast::Receiver<IncomingMessage>,
    filter: ReplyFilter,
) -> Result<IncomingMessage, WaitError> {
    loop {
        match receiver.recv().await {
            Ok(message) if filter.matches(&message) => return Ok(message),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "reply waiter lagged behind incoming messages");
            }
            Err(RecvError::Closed) => return Err(WaitError::Closed),
        }
    }
}
