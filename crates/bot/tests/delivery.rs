mod common;

use std::sync::Arc;

use storefront_auth::Invoker;
use storefront_bot::workflow::VOUCH_PROMPT;
use storefront_bot::workflow::delivery::terminal_state;
use storefront_bot::{CommandContext, CommandError, DeliveryRequest, DeliveryState};
use storefront_chat::in_memory::DM_REFUSED_REASON;
use storefront_core::{DomainError, Money, UserId};
use storefront_infra::GlobalSettings;

use common::*;

async fn deliver(h: &Harness, content: &str, vouch: &str) {
    let task = h.spawn(content);
    h.await_prompt(SHOP).await;
    h.reply_as(operator(), SHOP, vouch);
    task.await.unwrap();
}

#[tokio::test]
async fn delivery_decrements_stock_and_records_the_sale() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 5, "100.0");

    deliver(&h, "!deliver <@42> Netflix 2 100.0 email: a@b.c pass: hunter2", "legit +rep").await;

    assert_eq!(h.quantity("Netflix"), Some(3));

    let history = h.settings().purchase_history().unwrap();
    let records = history.for_buyer(BUYER);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].product, "Netflix");
    assert_eq!(records[0].quantity, 2);
    assert_eq!(records[0].price.to_string(), "₹100.00");
    assert_eq!(records[0].custom_text, "email: a@b.c pass: hunter2");
    assert_eq!(records[0].timestamp, NOW_LOCAL);
    assert_eq!(records[0].sold_by, "operator");

    let texts = h.texts(SHOP);
    assert_eq!(texts[0], VOUCH_PROMPT);
    assert_eq!(
        texts.last().unwrap(),
        &format!("Product `Netflix` delivered to <@42> via DM at {NOW_LOCAL}")
    );

    let dm = h.dm_embeds(BUYER);
    assert_eq!(dm.len(), 1);
    assert_eq!(dm[0].field_value("Here is your product"), Some("> Netflix 🎬"));
    assert_eq!(dm[0].field_value("Amount"), Some("> ₹200.00 (INR) / $2.40 (USD)"));
    assert_eq!(
        dm[0].field_value("Product info and credentials"),
        Some("||```email: a@b.c pass: hunter2```||")
    );
    assert_eq!(dm[0].field_value("__Vouch Format__"), Some("```legit +rep```"));

    let log = h.embeds(LOG);
    assert_eq!(log[0].title, "Event Log");
    assert_eq!(
        log[0].description.as_deref(),
        Some("Delivered 2x Netflix to <@42> at ₹200.00 (INR) / $2.40 (USD)")
    );
    assert_eq!(log[0].footer.as_deref(), Some("Logged by operator"));
    // 3 left is at or below the default threshold of 5.
    assert_eq!(log[1].title, "Stock Alert");
    assert_eq!(
        log[1].description.as_deref(),
        Some("The stock for `Netflix` is running low. Current quantity: 3.")
    );
}

#[tokio::test]
async fn delivering_the_last_units_removes_the_product() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 2, "100.0");

    deliver(&h, "!deliver <@42> Netflix 2 100.0 creds", "ok").await;

    assert_eq!(h.quantity("Netflix"), None);
    assert!(h.settings().stock().unwrap().is_empty());
    let alert = h.embeds(LOG).pop().unwrap();
    assert_eq!(
        alert.description.as_deref(),
        Some("The stock for `Netflix` is running low. Current quantity: 0.")
    );
}

#[tokio::test]
async fn requesting_more_than_available_is_rejected_without_side_effects() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 1, "100.0");

    h.run("!deliver <@42> Netflix 3 100.0 creds").await;

    assert_eq!(h.texts(SHOP), vec!["Insufficient stock for `Netflix`.".to_string()]);
    assert_eq!(h.quantity("Netflix"), Some(1));
    assert!(h.settings().purchase_history().unwrap().for_buyer(BUYER).is_empty());
    assert!(h.transport.sent_to(LOG).is_empty());
    assert!(h.transport.dm_channel_of(BUYER).is_none());
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let h = Harness::new();
    h.run("!deliver <@42> Spotify 1 50 creds").await;
    assert_eq!(h.last_text(SHOP).as_deref(), Some("Insufficient stock for `Spotify`."));
}

#[tokio::test]
async fn zero_quantity_is_a_validation_error() {
    let h = Harness::new();
    h.seed_stock("Netflix", 1, "100.0");
    h.run("!deliver <@42> Netflix 0 100 creds").await;

    let reply = h.last_text(SHOP).unwrap();
    assert!(reply.starts_with("Invalid input:"), "{reply}");
    assert_eq!(h.quantity("Netflix"), Some(1));
}

#[tokio::test]
async fn total_beyond_decimal_range_is_rejected_before_the_prompt() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 5, "100.0");

    h.run("!deliver <@42> Netflix 2 79228162514264337593543950335 creds").await;

    let texts = h.texts(SHOP);
    assert_eq!(texts.len(), 1, "{texts:?}");
    assert!(texts[0].starts_with("Invalid input:"), "{}", texts[0]);
    assert!(texts[0].contains("amount too large"), "{}", texts[0]);
    assert_eq!(h.quantity("Netflix"), Some(5));
    assert!(h.dm_embeds(BUYER).is_empty());
    assert!(h.transport.sent_to(LOG).is_empty());
}

fn request(quantity: u32, price: &str) -> DeliveryRequest {
    DeliveryRequest {
        buyer: BUYER,
        product: "Netflix".to_string(),
        quantity,
        price: Money::parse(price).unwrap(),
        custom_text: "creds".to_string(),
    }
}

fn operator_context() -> CommandContext {
    CommandContext::new(GUILD, SHOP, Invoker::new(OPERATOR, "operator"))
}

#[tokio::test]
async fn deliver_returns_a_receipt_for_committed_sales() {
    let h = Harness::new();
    h.seed_stock("Netflix", 5, "100.0");

    let manager = Arc::clone(&h.manager);
    let task =
        tokio::spawn(async move { manager.deliver(&operator_context(), request(2, "100")).await });
    h.await_prompt(SHOP).await;
    h.reply_as(operator(), SHOP, "thanks");
    let outcome = task.await.unwrap();

    assert_eq!(terminal_state(&outcome), DeliveryState::Committed);
    let receipt = outcome.unwrap();
    assert_eq!(receipt.remaining, 3);
    assert_eq!(receipt.purchased_at, NOW_LOCAL);
    assert_eq!(receipt.quote.render(), "₹200.00 (INR) / $2.40 (USD)");
    assert_eq!(h.quantity("Netflix"), Some(3));
}

#[tokio::test]
async fn deliver_reports_overflowing_totals_as_rejected() {
    let h = Harness::new();
    h.seed_stock("Netflix", 5, "100.0");

    let outcome = h
        .manager
        .deliver(&operator_context(), request(2, "79228162514264337593543950335"))
        .await;

    assert_eq!(terminal_state(&outcome), DeliveryState::Rejected);
    assert!(matches!(
        outcome,
        Err(CommandError::Invalid(DomainError::Validation(_)))
    ));
    assert!(h.texts(SHOP).is_empty());
    assert_eq!(h.quantity("Netflix"), Some(5));
}

#[tokio::test(start_paused = true)]
async fn confirmation_timeout_cancels_the_delivery() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 5, "100.0");

    let task = h.spawn("!deliver <@42> Netflix 2 100.0 creds");
    h.await_prompt(SHOP).await;
    // A reply from someone else does not count as confirmation.
    h.reply_as(member(7, &[]), SHOP, "not the operator");
    task.await.unwrap();

    assert_eq!(
        h.last_text(SHOP).as_deref(),
        Some("You took too long to respond. Delivery cancelled.")
    );
    assert_eq!(h.quantity("Netflix"), Some(5));
    assert!(h.settings().purchase_history().unwrap().for_buyer(BUYER).is_empty());
    assert!(h.dm_embeds(BUYER).is_empty());
    assert!(h.transport.sent_to(LOG).is_empty());
}

#[tokio::test]
async fn refused_private_message_leaves_everything_unchanged() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 5, "100.0");
    h.transport.block_dms(BUYER);

    deliver(&h, "!deliver <@42> Netflix 2 100.0 creds", "vouch").await;

    assert_eq!(
        h.last_text(SHOP),
        Some(format!(
            "Failed to deliver the product `Netflix` to <@42>. Reason: {DM_REFUSED_REASON}"
        ))
    );
    assert_eq!(h.quantity("Netflix"), Some(5));
    assert!(h.settings().purchase_history().unwrap().for_buyer(BUYER).is_empty());
    assert!(h.transport.sent_to(LOG).is_empty());
}

#[tokio::test]
async fn concurrent_deliveries_cannot_oversell() {
    let h = Harness::new();
    h.seed_stock("Netflix", 1, "100.0");

    let first = h.spawn_as(operator(), SHOP, "!deliver <@42> Netflix 1 100 creds-a");
    let second = h.spawn_as(second_operator(), BACKROOM, "!deliver <@43> Netflix 1 100 creds-b");
    h.await_prompt(SHOP).await;
    h.await_prompt(BACKROOM).await;

    h.reply_as(operator(), SHOP, "vouch a");
    h.reply_as(second_operator(), BACKROOM, "vouch b");
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(h.quantity("Netflix"), None);
    let history = h.settings().purchase_history().unwrap();
    assert_eq!(history.total_records(), 1);

    let delivered = h.dm_embeds(BUYER).len() + h.dm_embeds(UserId::new(43)).len();
    assert_eq!(delivered, 1);

    let rejections = [SHOP, BACKROOM]
        .into_iter()
        .filter(|channel| {
            h.last_text(*channel).as_deref() == Some("Insufficient stock for `Netflix`.")
        })
        .count();
    assert_eq!(rejections, 1);
}

#[tokio::test]
async fn repeated_deliveries_append_to_history() {
    let h = Harness::new();
    h.seed_stock("Netflix", 10, "100.0");

    deliver(&h, "!deliver <@42> Netflix 1 100 first", "v1").await;
    deliver(&h, "!deliver 42 Netflix 2 90 second", "v2").await;

    let history = h.settings().purchase_history().unwrap();
    let records = history.for_buyer(BUYER);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].custom_text, "first");
    assert_eq!(records[1].custom_text, "second");
    assert_eq!(records[1].price.to_string(), "₹90.00");
    assert_eq!(h.quantity("Netflix"), Some(7));
}

#[tokio::test]
async fn alert_respects_the_stored_threshold() {
    let h = Harness::new();
    h.use_log_channel();
    h.seed_stock("Netflix", 10, "100.0");
    GlobalSettings::new(h.store.as_ref(), 5)
        .set_restock_threshold(2)
        .unwrap();

    deliver(&h, "!deliver <@42> Netflix 5 100 creds", "v").await;

    let titles: Vec<_> = h.embeds(LOG).into_iter().map(|embed| embed.title).collect();
    assert_eq!(titles, vec!["Event Log".to_string()]);
}

#[tokio::test]
async fn missing_log_channel_does_not_block_delivery() {
    let h = Harness::new();
    h.seed_stock("Netflix", 5, "100.0");

    deliver(&h, "!deliver <@42> Netflix 1 100 creds", "v").await;

    assert_eq!(h.quantity("Netflix"), Some(4));
    assert!(h.transport.sent_to(LOG).is_empty());
}
