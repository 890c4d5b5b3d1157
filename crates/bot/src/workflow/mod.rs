//! Multi-step workflows.

pub mod delivery;

pub use delivery::{DeliveryOutcome, DeliveryReceipt, DeliveryRequest, DeliveryState, VOUCH_PROMPT};
