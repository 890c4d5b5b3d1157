//! Message model shared by all transports.

use chrono::{DateTime, Utc};

use storefront_core::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// Embed accent colours used by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    Purple,
    Green,
    Teal,
    Red,
    Blue,
    Gold,
    Orange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich message card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub colour: Colour,
    pub author: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub image_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new(title: impl Into<String>, colour: Colour) -> Self {
        Self {
            title: title.into(),
            description: None,
            colour,
            author: None,
            fields: Vec::new(),
            footer: None,
            image_url: None,
            timestamp: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Append a full-width field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// A message the bot sends: plain text, an embed, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
        }
    }

    /// Plain-text rendering, used by the console transport and in logs.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        if let Some(content) = &self.content {
            out.push_str(content);
        }
        if let Some(embed) = &self.embed {
            if !out.is_empty() {
                out.push('\n');
            }
            if let Some(author) = &embed.author {
                out.push_str(&format!("[{author}]\n"));
            }
            out.push_str(&format!("== {} ==", embed.title));
            if let Some(description) = &embed.description {
                out.push_str(&format!("\n{description}"));
            }
            for field in &embed.fields {
                out.push_str(&format!("\n{}:\n{}", field.name, field.value));
            }
            if let Some(footer) = &embed.footer {
                out.push_str(&format!("\n-- {footer}"));
            }
        }
        out
    }
}

/// The sender of an incoming message, with the guild-level facts the guards
/// need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub roles: Vec<RoleId>,
    pub administrator: bool,
    pub bot: bool,
}

impl Author {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            roles: Vec::new(),
            administrator: false,
            bot: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: MessageId,
    /// `None` for private channels.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
}
