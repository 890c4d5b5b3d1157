//! Command error taxonomy.
//!
//! The `Display` of every variant is the reply the invoker sees.

use thiserror::Error;

use storefront_chat::TransportError;
use storefront_core::{ChannelId, DomainError, UserId};
use storefront_infra::StoreError;

use crate::commands::{CommandKind, ParseError};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("This command can only be used in a server.")]
    NotInGuild,

    #[error("You do not have permission to use `{}`.", .0.name())]
    Forbidden(CommandKind),

    #[error("{reason}. Usage: `{prefix}{}`", .kind.usage())]
    Usage {
        prefix: String,
        kind: CommandKind,
        reason: String,
    },

    #[error("Insufficient stock for `{product}`.")]
    InsufficientStock { product: String },

    #[error("You took too long to respond. Delivery cancelled.")]
    ConfirmationTimeout,

    #[error("Failed to deliver the product `{product}` to {}. Reason: {reason}", .buyer.mention())]
    DeliveryFailed {
        product: String,
        buyer: UserId,
        reason: TransportError,
    },

    #[error("{0} not found in stock.")]
    ProductNotFound(String),

    #[error("I could not find the channel {}.", .0.mention())]
    ChannelUnreachable(ChannelId),

    #[error("Invalid input: {0}")]
    Invalid(DomainError),

    #[error("Something went wrong while saving the store settings.")]
    Store(#[from] StoreError),

    #[error("Could not reach the chat service: {0}")]
    Transport(#[from] TransportError),
}

impl CommandError {
    pub fn usage(prefix: &str, err: ParseError) -> Self {
        Self::Usage {
            prefix: prefix.to_string(),
            kind: err.kind,
            reason: err.reason,
        }
    }

    /// Whether the failure is the invoker's doing rather than the system's.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CommandError::Store(_) | CommandError::Transport(_))
    }
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock { product } => Self::InsufficientStock { product },
            DomainError::NotFound(product) => Self::ProductNotFound(product),
            other => Self::Invalid(other),
        }
    }
}
