//! The `deliver` workflow.
//!
//! ```text
//! Validating -> AwaitingConfirmation -> Delivering -> Committed
//!      |                 |                   |
//!   Rejected          Aborted             Failed / Rejected
//! ```
//!
//! Only `Committed` changes stored state. The confirmation wait happens
//! without the guild lock; stock is validated again once the lock is held.

use storefront_chat::{
    OutgoingMessage, ReplyFilter, ReplyWaiter, TransportError, WaitError, send_private,
};
use storefront_core::{Aggregate, GuildId, Money, OrderCode, UserId};
use storefront_infra::GuildSettings;
use storefront_inventory::{DeductStock, StockCommand, StockEvent};
use storefront_sales::{PurchaseRecord, Quote};

use crate::context::CommandContext;
use crate::embeds::{self, DeliveryCard};
use crate::error::CommandError;
use crate::manager::Manager;

pub const VOUCH_PROMPT: &str = "Please enter the vouch text:";

/// Arguments of `deliver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub buyer: UserId,
    pub product: String,
    pub quantity: u32,
    /// Unit price charged for this sale.
    pub price: Money,
    /// Credentials or instructions shown to the buyer.
    pub custom_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Validating,
    AwaitingConfirmation,
    Delivering,
    Committed,
    /// Not enough stock, or invalid request.
    Rejected,
    /// No confirmation before the deadline.
    Aborted,
    /// The private message could not be delivered.
    Failed,
}

impl DeliveryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeliveryState::Committed
                | DeliveryState::Rejected
                | DeliveryState::Aborted
                | DeliveryState::Failed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryState::Validating => "validating",
            DeliveryState::AwaitingConfirmation => "awaiting_confirmation",
            DeliveryState::Delivering => "delivering",
            DeliveryState::Committed => "committed",
            DeliveryState::Rejected => "rejected",
            DeliveryState::Aborted => "aborted",
            DeliveryState::Failed => "failed",
        }
    }
}

/// What a committed delivery produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub order: OrderCode,
    pub quote: Quote,
    pub purchased_at: String,
    /// Units left after the sale; zero means the product was removed.
    pub remaining: u32,
}

/// Result of one `deliver` invocation.
pub type DeliveryOutcome = Result<DeliveryReceipt, CommandError>;

/// Terminal state reached by an outcome.
pub fn terminal_state(outcome: &DeliveryOutcome) -> DeliveryState {
    match outcome {
        Ok(_) => DeliveryState::Committed,
        Err(CommandError::ConfirmationTimeout) => DeliveryState::Aborted,
        Err(CommandError::DeliveryFailed { .. }) => DeliveryState::Failed,
        Err(_) => DeliveryState::Rejected,
    }
}

struct Progress {
    guild: GuildId,
    buyer: UserId,
    state: DeliveryState,
}

impl Progress {
    fn advance(&mut self, next: DeliveryState) {
        tracing::debug!(
            guild = %self.guild,
            buyer = %self.buyer,
            from = self.state.as_str(),
            to = next.as_str(),
            "delivery state changed"
        );
        self.state = next;
    }
}

/// Run `deliver` to a terminal state.
pub(crate) async fn run(
    manager: &Manager,
    ctx: &CommandContext,
    request: DeliveryRequest,
) -> DeliveryOutcome {
    let mut progress = Progress {
        guild: ctx.guild_id(),
        buyer: request.buyer,
        state: DeliveryState::Validating,
    };
    let outcome = drive(manager, ctx, &request, &mut progress).await;
    progress.advance(terminal_state(&outcome));
    outcome
}

async fn drive(
    manager: &Manager,
    ctx: &CommandContext,
    request: &DeliveryRequest,
    progress: &mut Progress,
) -> DeliveryOutcome {
    let guild = ctx.guild_id();
    let settings = GuildSettings::new(manager.store.as_ref(), guild);

    settings
        .stock()?
        .check_available(&request.product, request.quantity)?;
    let quote = Quote::new(request.price, request.quantity, manager.config.exchange_rate)?;

    progress.advance(DeliveryState::AwaitingConfirmation);
    let filter = ReplyFilter {
        author: ctx.invoker().user_id,
        channel: ctx.channel_id(),
    };
    let waiter = ReplyWaiter::new(
        manager.transport.subscribe(),
        filter,
        manager.config.confirm_timeout,
    );
    manager
        .transport
        .send(ctx.channel_id(), OutgoingMessage::text(VOUCH_PROMPT))
        .await?;
    let vouch_text = match waiter.wait().await {
        Ok(reply) => reply.content,
        Err(WaitError::Timeout) => return Err(CommandError::ConfirmationTimeout),
        Err(WaitError::Closed) => return Err(TransportError::Closed.into()),
    };

    progress.advance(DeliveryState::Delivering);
    let guard = manager.locks.lock(guild).await;
    let mut stock = settings.stock()?;
    let entry = stock
        .check_available(&request.product, request.quantity)?
        .clone();

    let purchased_at = manager.config.local_time.format(manager.clock.now());
    let order = OrderCode::generate();
    let card = DeliveryCard {
        product: &request.product,
        emoji: entry.emoji_or_empty(),
        quote: &quote,
        purchased_at: &purchased_at,
        custom_text: &request.custom_text,
        vouch_text: &vouch_text,
        order: &order,
    };
    let message = OutgoingMessage::embed(embeds::delivery(&manager.config, &card, manager.clock.now()));

    if let Err(reason) = send_private(manager.transport.as_ref(), request.buyer, message).await {
        tracing::warn!(
            %guild,
            buyer = %request.buyer,
            product = %request.product,
            error = %reason,
            "private delivery failed"
        );
        return Err(CommandError::DeliveryFailed {
            product: request.product.clone(),
            buyer: request.buyer,
            reason,
        });
    }

    manager
        .reply_text(
            ctx.channel_id(),
            format!(
                "Product `{}` delivered to {} via DM at {}",
                request.product,
                request.buyer.mention(),
                purchased_at
            ),
        )
        .await;

    let events = stock.execute(&StockCommand::DeductStock(DeductStock {
        product: request.product.clone(),
        quantity: request.quantity,
    }))?;
    let remaining = events
        .iter()
        .find_map(|event| match event {
            StockEvent::StockDeducted(e) => Some(e.remaining),
            _ => None,
        })
        .unwrap_or_default();
    settings.set_stock(&stock)?;

    let mut history = settings.purchase_history()?;
    history.record(
        request.buyer,
        PurchaseRecord {
            product: request.product.clone(),
            quantity: request.quantity,
            price: request.price,
            custom_text: request.custom_text.clone(),
            timestamp: purchased_at.clone(),
            sold_by: ctx.invoker().name.clone(),
        },
    );
    settings.set_purchase_history(&history)?;
    drop(guard);

    tracing::info!(
        %guild,
        buyer = %request.buyer,
        product = %request.product,
        quantity = request.quantity,
        remaining,
        order = %order,
        "delivery committed"
    );

    manager
        .audit
        .record(
            guild,
            &ctx.invoker().name,
            &format!(
                "Delivered {}x {} to {} at {}",
                request.quantity,
                request.product,
                request.buyer.mention(),
                quote.render()
            ),
        )
        .await;
    manager.alert_if_low(guild, &request.product, remaining).await;

    Ok(DeliveryReceipt {
        order,
        quote,
        purchased_at,
        remaining,
    })
}
