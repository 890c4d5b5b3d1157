//! `storefront-core`: shared building blocks for the storefront crates.
//!
//! This crate contains **pure domain** primitives (no IO, no transport).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot};
pub use clock::{Clock, FixedClock, LocalTime, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{ChannelId, GuildId, MessageId, OrderCode, RoleId, UserId};
pub use money::{ExchangeRate, Money};
