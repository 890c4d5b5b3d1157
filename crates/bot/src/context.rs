use storefront_auth::Invoker;
use storefront_chat::IncomingMessage;
use storefront_core::{ChannelId, GuildId, MessageId};

use crate::error::CommandError;

/// Where and by whom a command was issued.
///
/// Only guild messages produce a context; every storefront command is scoped
/// to one guild's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    guild_id: GuildId,
    channel_id: ChannelId,
    message_id: MessageId,
    invoker: Invoker,
}

impl CommandContext {
    pub fn new(guild_id: GuildId, channel_id: ChannelId, invoker: Invoker) -> Self {
        Self {
            guild_id,
            channel_id,
            message_id: MessageId::new(0),
            invoker,
        }
    }

    pub fn from_message(message: &IncomingMessage) -> Result<Self, CommandError> {
        let guild_id = message.guild_id.ok_or(CommandError::NotInGuild)?;
        let author = &message.author;
        let invoker = Invoker::new(author.id, author.name.clone())
            .with_roles(author.roles.iter().copied())
            .with_administrator(author.administrator);

        Ok(Self {
            guild_id,
            channel_id: message.channel_id,
            message_id: message.id,
            invoker,
        })
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }
}
