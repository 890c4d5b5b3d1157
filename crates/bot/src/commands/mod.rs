//! Prefix command surface.
//!
//! A message is first [`split`] into its [`CommandKind`] and an argument
//! cursor; the guard for the kind runs before the arguments are parsed into
//! a [`Command`].

pub mod args;

use core::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use storefront_auth::{CommandAuthorization, Permission};
use storefront_core::{ChannelId, Money, RoleId, UserId};
use storefront_inventory::{AddProduct, RemoveProduct, UpdatePrice};

use crate::workflow::DeliveryRequest;

pub use args::{Args, parse_channel, parse_role, parse_user};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Deliver,
    Stock,
    AddProduct,
    RemoveProduct,
    UpdatePrice,
    ViewHistory,
    SetLogChannel,
    RestrictRole,
    UnrestrictRole,
    GrantPermissions,
    RevokePermissions,
    SetRestockThreshold,
}

impl CommandKind {
    pub const ALL: [CommandKind; 12] = [
        CommandKind::Deliver,
        CommandKind::Stock,
        CommandKind::AddProduct,
        CommandKind::RemoveProduct,
        CommandKind::UpdatePrice,
        CommandKind::ViewHistory,
        CommandKind::SetLogChannel,
        CommandKind::RestrictRole,
        CommandKind::UnrestrictRole,
        CommandKind::GrantPermissions,
        CommandKind::RevokePermissions,
        CommandKind::SetRestockThreshold,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Deliver => "deliver",
            CommandKind::Stock => "stock",
            CommandKind::AddProduct => "addproduct",
            CommandKind::RemoveProduct => "removeproduct",
            CommandKind::UpdatePrice => "updateprice",
            CommandKind::ViewHistory => "viewhistory",
            CommandKind::SetLogChannel => "setlogchannel",
            CommandKind::RestrictRole => "restrictrole",
            CommandKind::UnrestrictRole => "unrestrictrole",
            CommandKind::GrantPermissions => "grantpermissions",
            CommandKind::RevokePermissions => "revokepermissions",
            CommandKind::SetRestockThreshold => "setrestockthreshold",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Argument synopsis, without the prefix.
    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::Deliver => "deliver <@member> <product> <quantity> <price> <custom text>",
            CommandKind::Stock => "stock",
            CommandKind::AddProduct => {
                "addproduct <product> <quantity> <price> <emoji> [discount] [expiration]"
            }
            CommandKind::RemoveProduct => "removeproduct <product>",
            CommandKind::UpdatePrice => "updateprice <product> <price>",
            CommandKind::ViewHistory => "viewhistory [@member]",
            CommandKind::SetLogChannel => "setlogchannel <#channel>",
            CommandKind::RestrictRole => "restrictrole <@role>",
            CommandKind::UnrestrictRole => "unrestrictrole <@role>",
            CommandKind::GrantPermissions => "grantpermissions <@role>",
            CommandKind::RevokePermissions => "revokepermissions <@role>",
            CommandKind::SetRestockThreshold => "setrestockthreshold <quantity>",
        }
    }
}

impl CommandAuthorization for CommandKind {
    fn required_permission(&self) -> Permission {
        match self {
            CommandKind::Stock | CommandKind::ViewHistory => Permission::Public,
            CommandKind::Deliver
            | CommandKind::AddProduct
            | CommandKind::RemoveProduct
            | CommandKind::UpdatePrice => Permission::ManageStock,
            CommandKind::SetLogChannel
            | CommandKind::RestrictRole
            | CommandKind::UnrestrictRole
            | CommandKind::GrantPermissions
            | CommandKind::RevokePermissions
            | CommandKind::SetRestockThreshold => Permission::ManageSettings,
        }
    }
}

/// A fully parsed storefront command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Deliver(DeliveryRequest),
    Stock,
    AddProduct(AddProduct),
    RemoveProduct(RemoveProduct),
    UpdatePrice(UpdatePrice),
    ViewHistory { member: Option<UserId> },
    SetLogChannel { channel: ChannelId },
    RestrictRole { role: RoleId },
    UnrestrictRole { role: RoleId },
    GrantPermissions { role: RoleId },
    RevokePermissions { role: RoleId },
    SetRestockThreshold { threshold: u32 },
}

impl CommandAuthorization for Command {
    fn required_permission(&self) -> Permission {
        self.kind().required_permission()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid arguments for `{}`: {reason}", .kind.name())]
pub struct ParseError {
    pub kind: CommandKind,
    pub reason: String,
}

impl ParseError {
    fn new(kind: CommandKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Recognize `<prefix><name> ...`. Returns `None` for anything that is not a
/// storefront command, including unknown names.
pub fn split<'a>(prefix: &str, content: &'a str) -> Option<(CommandKind, Args<'a>)> {
    let body = content.strip_prefix(prefix)?;
    let end = body.find(char::is_whitespace).unwrap_or(body.len());
    let kind = CommandKind::from_name(&body[..end])?;
    Some((kind, Args::new(&body[end..])))
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Deliver(_) => CommandKind::Deliver,
            Command::Stock => CommandKind::Stock,
            Command::AddProduct(_) => CommandKind::AddProduct,
            Command::RemoveProduct(_) => CommandKind::RemoveProduct,
            Command::UpdatePrice(_) => CommandKind::UpdatePrice,
            Command::ViewHistory { .. } => CommandKind::ViewHistory,
            Command::SetLogChannel { .. } => CommandKind::SetLogChannel,
            Command::RestrictRole { .. } => CommandKind::RestrictRole,
            Command::UnrestrictRole { .. } => CommandKind::UnrestrictRole,
            Command::GrantPermissions { .. } => CommandKind::GrantPermissions,
            Command::RevokePermissions { .. } => CommandKind::RevokePermissions,
            Command::SetRestockThreshold { .. } => CommandKind::SetRestockThreshold,
        }
    }

    /// Parse the arguments of an already recognized command. Extra trailing
    /// arguments are ignored.
    pub fn parse(kind: CommandKind, mut args: Args<'_>) -> Result<Self, ParseError> {
        let mut p = Parser { kind, args: &mut args };
        let command = match kind {
            CommandKind::Deliver => Command::Deliver(DeliveryRequest {
                buyer: p.required("member", parse_user)?,
                product: p.token("product")?,
                quantity: p.required("quantity", |raw| raw.parse::<u32>().ok())?,
                price: p.price()?,
                custom_text: p.rest("custom text")?,
            }),
            CommandKind::Stock => Command::Stock,
            CommandKind::AddProduct => Command::AddProduct(AddProduct {
                product: p.token("product")?,
                quantity: p.required("quantity", |raw| raw.parse::<u32>().ok())?,
                price: p.price()?,
                emoji: Some(p.token("emoji")?),
                discount: p.optional("discount", parse_discount)?.unwrap_or(Decimal::ZERO),
                expiration: p.args.rest(),
            }),
            CommandKind::RemoveProduct => Command::RemoveProduct(RemoveProduct {
                product: p.token("product")?,
            }),
            CommandKind::UpdatePrice => Command::UpdatePrice(UpdatePrice {
                product: p.token("product")?,
                price: p.price()?,
            }),
            CommandKind::ViewHistory => Command::ViewHistory {
                member: p.optional("member", parse_user)?,
            },
            CommandKind::SetLogChannel => Command::SetLogChannel {
                channel: p.required("channel", parse_channel)?,
            },
            CommandKind::RestrictRole => Command::RestrictRole {
                role: p.required("role", parse_role)?,
            },
            CommandKind::UnrestrictRole => Command::UnrestrictRole {
                role: p.required("role", parse_role)?,
            },
            CommandKind::GrantPermissions => Command::GrantPermissions {
                role: p.required("role", parse_role)?,
            },
            CommandKind::RevokePermissions => Command::RevokePermissions {
                role: p.required("role", parse_role)?,
            },
            CommandKind::SetRestockThreshold => Command::SetRestockThreshold {
                threshold: p.required("quantity", |raw| raw.parse::<u32>().ok())?,
            },
        };
        Ok(command)
    }
}

/// `0.1` or `10%`.
fn parse_discount(raw: &str) -> Option<Decimal> {
    match raw.strip_suffix('%') {
        Some(percent) => Decimal::from_str(percent.trim())
            .ok()
            .map(|value| value / Decimal::ONE_HUNDRED),
        None => Decimal::from_str(raw).ok(),
    }
}

struct Parser<'p, 'a> {
    kind: CommandKind,
    args: &'p mut Args<'a>,
}

impl Parser<'_, '_> {
    fn missing(&self, what: &str) -> ParseError {
        ParseError::new(self.kind, format!("missing {what}"))
    }

    fn token(&mut self, what: &str) -> Result<String, ParseError> {
        self.args.next_token().ok_or_else(|| self.missing(what))
    }

    fn required<T>(&mut self, what: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, ParseError> {
        let raw = self.token(what)?;
        parse(&raw).ok_or_else(|| ParseError::new(self.kind, format!("`{raw}` is not a valid {what}")))
    }

    fn optional<T>(
        &mut self,
        what: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>, ParseError> {
        match self.args.next_token() {
            None => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| ParseError::new(self.kind, format!("`{raw}` is not a valid {what}"))),
        }
    }

    fn price(&mut self) -> Result<Money, ParseError> {
        let raw = self.token("price")?;
        Money::parse(&raw).map_err(|e| ParseError::new(self.kind, e.to_string()))
    }

    fn rest(&mut self, what: &str) -> Result<String, ParseError> {
        self.args.rest().ok_or_else(|| self.missing(what))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<Result<Command, ParseError>> {
        split("!", content).map(|(kind, args)| Command::parse(kind, args))
    }

    #[test]
    fn unknown_or_unprefixed_messages_are_not_commands() {
        assert!(parse("!help").is_none());
        assert!(parse("stock").is_none());
        assert!(parse("!").is_none());
        assert!(parse("!stocks").is_none());
    }

    #[test]
    fn deliver_takes_the_rest_of_the_line_as_custom_text() {
        let command = parse("!deliver <@!42> Netflix 2 100 email: a@b.c pass: hunter2")
            .unwrap()
            .unwrap();
        assert_eq!(
            command,
            Command::Deliver(DeliveryRequest {
                buyer: UserId::new(42),
                product: "Netflix".to_string(),
                quantity: 2,
                price: Money::parse("100").unwrap(),
                custom_text: "email: a@b.c pass: hunter2".to_string(),
            })
        );
        assert_eq!(command.required_permission(), Permission::ManageStock);
    }

    #[test]
    fn deliver_without_custom_text_is_a_usage_error() {
        let err = parse("!deliver <@42> Netflix 2 100").unwrap().unwrap_err();
        assert_eq!(err.kind, CommandKind::Deliver);
        assert_eq!(err.reason, "missing custom text");
    }

    #[test]
    fn negative_quantities_and_prices_do_not_parse() {
        assert!(parse("!deliver <@42> Netflix -1 100 text").unwrap().is_err());
        assert!(parse("!deliver <@42> Netflix 1 -100 text").unwrap().is_err());
    }

    #[test]
    fn addproduct_with_optional_discount_and_expiration() {
        let command = parse(r#"!addproduct "Prime Video" 3 149.5 🎥 10% 30 days"#)
            .unwrap()
            .unwrap();
        match command {
            Command::AddProduct(add) => {
                assert_eq!(add.product, "Prime Video");
                assert_eq!(add.quantity, 3);
                assert_eq!(add.emoji.as_deref(), Some("🎥"));
                assert_eq!(add.discount, Decimal::from_str("0.1").unwrap());
                assert_eq!(add.expiration.as_deref(), Some("30 days"));
            }
            other => panic!("Expected AddProduct, got {other:?}"),
        }

        match parse("!addproduct Netflix 5 100 🎬").unwrap().unwrap() {
            Command::AddProduct(add) => {
                assert_eq!(add.discount, Decimal::ZERO);
                assert_eq!(add.expiration, None);
            }
            other => panic!("Expected AddProduct, got {other:?}"),
        }
    }

    #[test]
    fn viewhistory_member_is_optional() {
        assert_eq!(
            parse("!viewhistory").unwrap().unwrap(),
            Command::ViewHistory { member: None }
        );
        assert_eq!(
            parse("!viewhistory <@5>").unwrap().unwrap(),
            Command::ViewHistory {
                member: Some(UserId::new(5))
            }
        );
        assert!(parse("!viewhistory someone").unwrap().is_err());
    }

    #[test]
    fn settings_commands_take_mentions() {
        assert_eq!(
            parse("!setlogchannel <#77>").unwrap().unwrap(),
            Command::SetLogChannel {
                channel: ChannelId::new(77)
            }
        );
        assert_eq!(
            parse("!restrictrole <@&8>").unwrap().unwrap(),
            Command::RestrictRole { role: RoleId::new(8) }
        );
        assert_eq!(
            parse("!unrestrictrole 8").unwrap().unwrap(),
            Command::UnrestrictRole { role: RoleId::new(8) }
        );
        assert_eq!(
            parse("!revokepermissions <@&9>").unwrap().unwrap(),
            Command::RevokePermissions { role: RoleId::new(9) }
        );
        assert_eq!(
            parse("!setrestockthreshold 3").unwrap().unwrap(),
            Command::SetRestockThreshold { threshold: 3 }
        );
    }

    #[test]
    fn every_kind_round_trips_its_name() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()), Some(kind));
            assert!(kind.usage().starts_with(kind.name()));
        }
    }
}
