//! Sales domain module: pricing of a sale and the per-buyer purchase ledger.

pub mod history;
pub mod pricing;

pub use history::{PurchaseHistory, PurchaseRecord};
pub use pricing::Quote;
