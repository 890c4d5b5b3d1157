//! Argument tokenizer and mention parsing.

use core::str::FromStr;

use storefront_core::{ChannelId, RoleId, UserId};

/// Cursor over the argument part of a command line.
///
/// Arguments are whitespace separated; a double-quoted argument may contain
/// spaces. [`Args::rest`] hands out the unparsed remainder verbatim.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    remaining: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            remaining: input.trim_start(),
        }
    }

    /// Next argument, with surrounding quotes removed. An unterminated quote
    /// runs to the end of the line.
    pub fn next_token(&mut self) -> Option<String> {
        let input = self.remaining.trim_start();
        if input.is_empty() {
            self.remaining = input;
            return None;
        }

        if let Some(quoted) = input.strip_prefix('"') {
            let (token, rest) = match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            };
            self.remaining = rest.trim_start();
            return Some(token.to_string());
        }

        let end = input.find(char::is_whitespace).unwrap_or(input.len());
        self.remaining = input[end..].trim_start();
        Some(input[..end].to_string())
    }

    /// The rest of the line, trimmed. `None` when nothing is left.
    pub fn rest(&mut self) -> Option<String> {
        let rest = self.remaining.trim();
        self.remaining = "";
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.trim().is_empty()
    }
}

fn snowflake<T: FromStr>(raw: &str, prefixes: &[&str]) -> Option<T> {
    let raw = raw.trim();
    let inner = match raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        Some(mention) => prefixes.iter().find_map(|p| mention.strip_prefix(p))?,
        None => raw,
    };
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    inner.parse().ok()
}

/// `<@id>`, `<@!id>` or a bare id.
pub fn parse_user(raw: &str) -> Option<UserId> {
    snowflake(raw, &["@!", "@"])
}

/// `<#id>` or a bare id.
pub fn parse_channel(raw: &str) -> Option<ChannelId> {
    snowflake(raw, &["#"])
}

/// `<@&id>` or a bare id.
pub fn parse_role(raw: &str) -> Option<RoleId> {
    snowflake(raw, &["@&"])
}
