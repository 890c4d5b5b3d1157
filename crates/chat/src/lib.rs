//! Chat transport abstraction (mechanics only).
//!
//! The storefront never speaks a chat protocol itself. It talks to a
//! [`ChatTransport`]: something that can post to a channel, open a private
//! channel with a user, resolve channel ids and stream incoming messages.
//! A gateway client plugs in behind the trait; this crate ships an in-memory
//! transport for tests and a console transport for local runs.

pub mod console;
pub mod in_memory;
pub mod message;
pub mod transport;
pub mod wait;

pub use console::ConsoleTransport;
pub use in_memory::{InMemoryTransport, SentMessage};
pub use message::{Author, Colour, Embed, EmbedField, IncomingMessage, OutgoingMessage};
pub use transport::{ChatTransport, TransportError, send_private};
pub use wait::{ReplyFilter, ReplyWaiter, WaitError};
