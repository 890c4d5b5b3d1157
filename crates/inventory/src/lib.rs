//! Stock domain module.
//!
//! This crate contains the business rules for a guild's stock table,
//! implemented purely as deterministic domain logic (no IO, no transport,
//! no storage).

pub mod stock;

pub use stock::{
    AddProduct, DeductStock, PriceUpdated, ProductRemoved, ProductStocked, RemoveProduct,
    StockCommand, StockDeducted, StockEntry, StockEvent, StockTable, UpdatePrice,
};
