use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, AggregateRoot, DomainError, GuildId, Money};

/// One product line in a guild's stock table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub quantity: u32,
    /// Unit price in the reference currency.
    pub price: Money,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Advertised discount as a fraction (0.1 = 10%). Display only.
    #[serde(default)]
    pub discount: Decimal,
    /// Free-form expiration note. Display only.
    #[serde(default)]
    pub expiration: Option<String>,
}

impl StockEntry {
    pub fn new(quantity: u32, price: Money) -> Self {
        Self {
            quantity,
            price,
            emoji: None,
            discount: Decimal::ZERO,
            expiration: None,
        }
    }

    pub fn with_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Emoji or the empty string, for inline rendering.
    pub fn emoji_or_empty(&self) -> &str {
        self.emoji.as_deref().unwrap_or("")
    }
}

/// Aggregate root: the stock table of one guild.
///
/// Invariant: every present entry has `quantity > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTable {
    guild_id: GuildId,
    entries: BTreeMap<String, StockEntry>,
    version: u64,
}

impl StockTable {
    pub fn empty(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            entries: BTreeMap::new(),
            version: 0,
        }
    }

    /// Rehydrate from persisted entries. Entries violating the quantity
    /// invariant are dropped.
    pub fn from_entries(guild_id: GuildId, entries: BTreeMap<String, StockEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|(_, entry)| entry.quantity > 0)
            .collect();
        Self {
            guild_id,
            entries,
            version: 0,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, StockEntry> {
        &self.entries
    }

    pub fn into_entries(self) -> BTreeMap<String, StockEntry> {
        self.entries
    }

    pub fn get(&self, product: &str) -> Option<&StockEntry> {
        self.entries.get(product)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check that `quantity` units of `product` can be sold right now.
    pub fn check_available(&self, product: &str, quantity: u32) -> Result<&StockEntry, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        match self.entries.get(product) {
            Some(entry) if entry.quantity >= quantity => Ok(entry),
            _ => Err(DomainError::insufficient_stock(product)),
        }
    }
}

impl AggregateRoot for StockTable {
    type Id = GuildId;

    fn id(&self) -> &Self::Id {
        &self.guild_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddProduct (insert, or restock and overwrite pricing metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub product: String,
    pub quantity: u32,
    pub price: Money,
    pub emoji: Option<String>,
    pub discount: Decimal,
    pub expiration: Option<String>,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product: String,
}

/// Command: UpdatePrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePrice {
    pub product: String,
    pub price: Money,
}

/// Command: DeductStock (a sale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductStock {
    pub product: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    AddProduct(AddProduct),
    RemoveProduct(RemoveProduct),
    UpdatePrice(UpdatePrice),
    DeductStock(DeductStock),
}

/// Event: ProductStocked. `entry` is the full entry after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStocked {
    pub product: String,
    pub quantity_added: u32,
    pub restocked: bool,
    pub entry: StockEntry,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub product: String,
}

/// Event: PriceUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdated {
    pub product: String,
    pub old_price: Money,
    pub new_price: Money,
}

/// Event: StockDeducted. A `remaining` of zero removes the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDeducted {
    pub product: String,
    pub quantity: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    ProductStocked(ProductStocked),
    ProductRemoved(ProductRemoved),
    PriceUpdated(PriceUpdated),
    StockDeducted(StockDeducted),
}

impl Aggregate for StockTable {
    type Command = StockCommand;
    type Event = StockEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockEvent::ProductStocked(e) => {
                self.entries.insert(e.product.clone(), e.entry.clone());
            }
            StockEvent::ProductRemoved(e) => {
                self.entries.remove(&e.product);
            }
            StockEvent::PriceUpdated(e) => {
                if let Some(entry) = self.entries.get_mut(&e.product) {
                    entry.price = e.new_price;
                }
            }
            StockEvent::StockDeducted(e) => {
                if e.remaining == 0 {
                    self.entries.remove(&e.product);
                } else if let Some(entry) = self.entries.get_mut(&e.product) {
                    entry.quantity = e.remaining;
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::AddProduct(cmd) => self.handle_add(cmd),
            StockCommand::RemoveProduct(cmd) => self.handle_remove(cmd),
            StockCommand::UpdatePrice(cmd) => self.handle_update_price(cmd),
            StockCommand::DeductStock(cmd) => self.handle_deduct(cmd),
        }
    }
}

impl StockTable {
    fn handle_add(&self, cmd: &AddProduct) -> Result<Vec<StockEvent>, DomainError> {
        if cmd.product.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if cmd.quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if cmd.discount < Decimal::ZERO || cmd.discount > Decimal::ONE {
            return Err(DomainError::validation("discount must be between 0 and 1"));
        }

        let existing = self.entries.get(&cmd.product);
        let quantity = match existing {
            Some(entry) => entry
                .quantity
                .checked_add(cmd.quantity)
                .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?,
            None => cmd.quantity,
        };

        Ok(vec![StockEvent::ProductStocked(ProductStocked {
            product: cmd.product.clone(),
            quantity_added: cmd.quantity,
            restocked: existing.is_some(),
            entry: StockEntry {
                quantity,
                price: cmd.price,
                emoji: cmd.emoji.clone(),
                discount: cmd.discount,
                expiration: cmd.expiration.clone(),
            },
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Result<Vec<StockEvent>, DomainError> {
        if !self.entries.contains_key(&cmd.product) {
            return Err(DomainError::not_found(cmd.product.clone()));
        }
        Ok(vec![StockEvent::ProductRemoved(ProductRemoved {
            product: cmd.product.clone(),
        })])
    }

    fn handle_update_price(&self, cmd: &UpdatePrice) -> Result<Vec<StockEvent>, DomainError> {
        let entry = self
            .entries
            .get(&cmd.product)
            .ok_or_else(|| DomainError::not_found(cmd.product.clone()))?;
        Ok(vec![StockEvent::PriceUpdated(PriceUpdated {
            product: cmd.product.clone(),
            old_price: entry.price,
            new_price: cmd.price,
        })])
    }

    fn handle_deduct(&self, cmd: &DeductStock) -> Result<Vec<StockEvent>, DomainError> {
        let entry = self.check_available(&cmd.product, cmd.quantity)?;
        Ok(vec![StockEvent::StockDeducted(StockDeducted {
            product: cmd.product.clone(),
            quantity: cmd.quantity,
            remaining: entry.quantity - cmd.quantity,
        })])
    }
}
