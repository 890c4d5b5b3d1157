//! Embed rendering for replies and private deliveries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use storefront_chat::{Colour, Embed};
use storefront_core::{ExchangeRate, Money, OrderCode, UserId};
use storefront_infra::StorefrontConfig;
use storefront_inventory::{StockEntry, StockTable};
use storefront_sales::{PurchaseRecord, Quote};

pub const DELIVERY_FOOTER: &str = "Thanks for order. No vouch, no warranty";

/// Everything the private delivery message shows.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryCard<'a> {
    pub product: &'a str,
    pub emoji: &'a str,
    pub quote: &'a Quote,
    pub purchased_at: &'a str,
    pub custom_text: &'a str,
    pub vouch_text: &'a str,
    pub order: &'a OrderCode,
}

fn quoted(value: impl AsRef<str>) -> String {
    format!("> {}", value.as_ref())
}

fn with_emoji(product: &str, emoji: &str) -> String {
    if emoji.is_empty() {
        product.to_string()
    } else {
        format!("{product} {emoji}")
    }
}

fn percent(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).normalize())
}

pub fn delivery(config: &StorefrontConfig, card: &DeliveryCard<'_>, now: DateTime<Utc>) -> Embed {
    let mut embed = Embed::new(format!("__{}__", config.store_name), Colour::Purple)
        .author(config.store_name.clone())
        .field("Here is your product", quoted(with_emoji(card.product, card.emoji)))
        .field("Amount", quoted(card.quote.render()))
        .field("Purchase Date", quoted(card.purchased_at));

    let mut links = Vec::new();
    if let Some(tos) = &config.tos_url {
        links.push(format!("- Follow our [TOS]({tos}) & be a smart buyer!"));
    }
    if let Some(feedback) = &config.feedback_url {
        links.push(format!("- [CLICK HERE]({feedback}) to leave your __feedback__"));
    }
    if !links.is_empty() {
        embed = embed.field("\u{200b}", format!("**{}**", links.join("\n")));
    }

    embed = embed
        .field(
            "Product info and credentials",
            format!("||```{}```||", card.custom_text),
        )
        .field("__Vouch Format__", format!("```{}```", card.vouch_text))
        .footer(format!("{DELIVERY_FOOTER} | Order #{}", card.order))
        .timestamp(now);

    match &config.banner_url {
        Some(banner) => embed.image(banner.clone()),
        None => embed,
    }
}

fn stock_line(entry: &StockEntry, rate: ExchangeRate) -> String {
    [
        format!("**Quantity:** {}", entry.quantity),
        format!("**Price:** {}", rate.dual(entry.price)),
        format!(
            "**Expiration:** {}",
            entry.expiration.as_deref().unwrap_or("None")
        ),
        format!("**Discount:** {}", percent(entry.discount)),
    ]
    .iter()
    .map(quoted)
    .collect::<Vec<_>>()
    .join("\n")
}

/// `None` for an empty table.
pub fn stock_list(table: &StockTable, rate: ExchangeRate) -> Option<Embed> {
    if table.is_empty() {
        return None;
    }
    let embed = table.entries().iter().enumerate().fold(
        Embed::new("Available Stock", Colour::Green),
        |embed, (idx, (product, entry))| {
            embed.field(
                format!("{}. {}", idx + 1, with_emoji(product, entry.emoji_or_empty())),
                stock_line(entry, rate),
            )
        },
    );
    Some(embed)
}

pub fn product_added(
    product: &str,
    emoji: &str,
    quantity: u32,
    price: Money,
    rate: ExchangeRate,
) -> Embed {
    Embed::new("Product Added", Colour::Teal)
        .field("Product", quoted(with_emoji(product, emoji)))
        .field("Quantity", quoted(quantity.to_string()))
        .field("Price", quoted(rate.dual(price)))
}

pub fn product_removed(product: &str) -> Embed {
    Embed::new("Product Removed", Colour::Red).field("Product", quoted(product))
}

pub fn price_updated(product: &str, old: Money, new: Money, rate: ExchangeRate) -> Embed {
    Embed::new("Price Updated", Colour::Gold)
        .field("Product", quoted(product))
        .field("Old Price", quoted(rate.dual(old)))
        .field("New Price", quoted(rate.dual(new)))
}

pub fn purchase_history(member: UserId, records: &[PurchaseRecord]) -> Embed {
    records.iter().fold(
        Embed::new("Purchase History", Colour::Blue)
            .description(format!("Purchases of {}", member.mention())),
        |embed, record| {
            embed.field(
                format!("{} (x{})", record.product, record.quantity),
                [
                    format!("**Price:** {} (INR)", record.price),
                    format!("**Purchased on:** {}", record.timestamp),
                    format!("**Sold by:** {}", record.sold_by),
                    format!("**Custom Text:** {}", record.custom_text),
                ]
                .iter()
                .map(quoted)
                .collect::<Vec<_>>()
                .join("\n"),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use storefront_core::GuildId;

    fn money(raw: &str) -> Money {
        Money::parse(raw).unwrap()
    }

    #[test]
    fn delivery_card_layout() {
        let config = StorefrontConfig {
            tos_url: Some("https://example.com/tos".to_string()),
            banner_url: Some("https://example.com/banner.png".to_string()),
            ..StorefrontConfig::default()
        };
        let quote = Quote::new(money("100"), 2, config.exchange_rate).unwrap();
        let order = OrderCode::from_uuid(uuid_like());
        let card = DeliveryCard {
            product: "Netflix",
            emoji: "🎬",
            quote: &quote,
            purchased_at: "2024-08-02 00:15:00",
            custom_text: "user: a pass: b",
            vouch_text: "+rep legit",
            order: &order,
        };
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 18, 45, 0).unwrap();

        let embed = delivery(&config, &card, now);

        assert_eq!(embed.title, "__Frenzy Store__");
        assert_eq!(embed.field_value("Here is your product"), Some("> Netflix 🎬"));
        assert_eq!(
            embed.field_value("Amount"),
            Some("> ₹200.00 (INR) / $2.40 (USD)")
        );
        assert_eq!(embed.field_value("Purchase Date"), Some("> 2024-08-02 00:15:00"));
        assert_eq!(
            embed.field_value("Product info and credentials"),
            Some("||```user: a pass: b```||")
        );
        assert_eq!(embed.field_value("__Vouch Format__"), Some("```+rep legit```"));
        assert!(embed.field_value("\u{200b}").unwrap().contains("[TOS](https://example.com/tos)"));
        assert!(embed.footer.as_deref().unwrap().ends_with(&format!("Order #{order}")));
        assert_eq!(embed.image_url.as_deref(), Some("https://example.com/banner.png"));
    }

    #[test]
    fn links_field_is_omitted_without_urls() {
        let config = StorefrontConfig::default();
        let quote = Quote::new(money("1"), 1, config.exchange_rate).unwrap();
        let order = OrderCode::from_uuid(uuid_like());
        let card = DeliveryCard {
            product: "Netflix",
            emoji: "",
            quote: &quote,
            purchased_at: "",
            custom_text: "",
            vouch_text: "",
            order: &order,
        };
        let embed = delivery(&config, &card, Utc::now());
        assert_eq!(embed.field_value("\u{200b}"), None);
        assert_eq!(embed.field_value("Here is your product"), Some("> Netflix"));
    }

    #[test]
    fn stock_list_numbers_entries_in_name_order() {
        let mut entries = BTreeMap::new();
        entries.insert("Spotify".to_string(), StockEntry::new(1, money("50")));
        let mut netflix = StockEntry::new(3, money("100")).with_emoji("🎬");
        netflix.discount = Decimal::new(1, 1);
        netflix.expiration = Some("30 days".to_string());
        entries.insert("Netflix".to_string(), netflix);
        let table = StockTable::from_entries(GuildId::new(1), entries);

        let embed = stock_list(&table, ExchangeRate::DEFAULT).unwrap();
        assert_eq!(embed.fields[0].name, "1. Netflix 🎬");
        assert_eq!(embed.fields[1].name, "2. Spotify");
        assert_eq!(
            embed.fields[0].value,
            "> **Quantity:** 3\n> **Price:** ₹100.00 (INR) / $1.20 (USD)\n> **Expiration:** 30 days\n> **Discount:** 10%"
        );
        assert!(embed.fields[1].value.ends_with("> **Expiration:** None\n> **Discount:** 0%"));

        assert!(stock_list(&StockTable::empty(GuildId::new(1)), ExchangeRate::DEFAULT).is_none());
    }

    #[test]
    fn history_lists_every_record() {
        let record = PurchaseRecord {
            product: "Netflix".to_string(),
            quantity: 2,
            price: money("100"),
            custom_text: "creds".to_string(),
            timestamp: "2024-08-02 00:15:00".to_string(),
            sold_by: "operator".to_string(),
        };
        let embed = purchase_history(UserId::new(9), &[record.clone(), record]);
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.fields[0].name, "Netflix (x2)");
        assert!(embed.fields[0].value.starts_with("> **Price:** ₹100.00 (INR)"));
        assert_eq!(embed.description.as_deref(), Some("Purchases of <@9>"));
    }

    fn uuid_like() -> uuid::Uuid {
        uuid::Uuid::from_u128(0xab12_0000_0000_4000_8000_0000_0000_0000)
    }
}
