use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use storefront_core::{Money, UserId};

/// A completed sale, as shown by `viewhistory`. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub product: String,
    pub quantity: u32,
    /// Unit price in the reference currency.
    pub price: Money,
    pub custom_text: String,
    /// Local time, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    /// Name of the operator who ran the delivery.
    pub sold_by: String,
}

/// Append-only purchase ledger of one guild, keyed by buyer.
///
/// Buyer keys are decimal strings on disk, matching the settings file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseHistory(BTreeMap<String, Vec<PurchaseRecord>>);

impl PurchaseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the buyer's list, creating the list if absent.
    pub fn record(&mut self, buyer: UserId, record: PurchaseRecord) {
        self.0.entry(buyer.to_string()).or_default().push(record);
    }

    pub fn for_buyer(&self, buyer: UserId) -> &[PurchaseRecord] {
        self.0
            .get(&buyer.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total_records(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(product: &str, quantity: u32) -> PurchaseRecord {
        PurchaseRecord {
            product: product.to_string(),
            quantity,
            price: Money::parse("100.0").unwrap(),
            custom_text: "user:pass".to_string(),
            timestamp: "2024-08-02 00:15:00".to_string(),
            sold_by: "operator".to_string(),
        }
    }

    #[test]
    fn record_appends_in_order() {
        let buyer = UserId::new(7);
        let mut history = PurchaseHistory::new();
        history.record(buyer, record("Netflix", 2));
        history.record(buyer, record("Spotify", 1));

        let records = history.for_buyer(buyer);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product, "Netflix");
        assert_eq!(records[1].product, "Spotify");
    }

    #[test]
    fn unknown_buyer_has_empty_history() {
        assert!(PurchaseHistory::new().for_buyer(UserId::new(1)).is_empty());
    }

    #[test]
    fn persists_keyed_by_decimal_buyer_id() {
        let mut history = PurchaseHistory::new();
        history.record(UserId::new(7), record("Netflix", 2));
        let value = serde_json::to_value(&history).unwrap();
        assert_eq!(value["7"][0]["product"], "Netflix");
        assert_eq!(value["7"][0]["sold_by"], "operator");
    }
}
