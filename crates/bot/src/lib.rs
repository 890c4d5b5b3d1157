//! The storefront cog: command parsing, guards, the delivery workflow and the
//! admin commands, wired over an injected chat transport and settings store.

pub mod authz;
pub mod commands;
pub mod context;
pub mod embeds;
pub mod error;
pub mod manager;
pub mod workflow;

pub use commands::{Command, CommandKind, ParseError};
pub use context::CommandContext;
pub use error::CommandError;
pub use manager::Manager;
pub use workflow::{DeliveryOutcome, DeliveryReceipt, DeliveryRequest, DeliveryState};
