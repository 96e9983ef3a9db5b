//! Post-commit notification pipeline.
//!
//! Checkout and status transitions enqueue a [`Notification`] onto an
//! unbounded channel and move on; a background worker owns delivery. The
//! message-passing boundary is what architecturally guarantees that a slow
//! or failing notification can never roll a committed transaction back -
//! by the time the worker sees the order id, the transaction is history.

use sqlx::PgPool;
use tokio::sync::mpsc;

use orderflow_core::{OrderId, OrderState};

use crate::db::OrderRepository;
use crate::models::OrderSummary;
use crate::services::email::EmailService;

/// An event the worker should tell the buyer about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A basket was checked out into a placed order.
    OrderPlaced {
        order_id: OrderId,
    },
    /// An order moved between lifecycle states.
    StatusChanged {
        order_id: OrderId,
        from: OrderState,
        to: OrderState,
    },
}

impl Notification {
    /// The order this notification concerns.
    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::OrderPlaced { order_id } | Self::StatusChanged { order_id, .. } => *order_id,
        }
    }
}

/// Fire-and-forget sender half handed to request handlers.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Enqueue an order-placed confirmation.
    pub fn order_placed(&self, order_id: OrderId) {
        self.send(Notification::OrderPlaced { order_id });
    }

    /// Enqueue a status-change notification.
    pub fn order_status_changed(&self, order_id: OrderId, from: OrderState, to: OrderState) {
        self.send(Notification::StatusChanged { order_id, from, to });
    }

    fn send(&self, notification: Notification) {
        let order_id = notification.order_id();
        if self.tx.send(notification).is_err() {
            // Worker gone (shutdown); the order itself is already committed.
            tracing::error!(%order_id, "Notification worker unavailable, event dropped");
        }
    }

    /// A notifier whose events go nowhere. For tests.
    #[must_use]
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { tx }
    }
}

/// Spawn the delivery worker and return its sender handle.
///
/// With no [`EmailService`] configured the worker still runs and logs each
/// event, which keeps notification behavior observable in development.
#[must_use]
pub fn spawn_worker(pool: PgPool, email: Option<EmailService>) -> Notifier {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run_worker(rx, pool, email));
    Notifier { tx }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    pool: PgPool,
    email: Option<EmailService>,
) {
    while let Some(notification) = rx.recv().await {
        let order_id = notification.order_id();
        if let Err(e) = deliver(&pool, email.as_ref(), &notification).await {
            tracing::error!(%order_id, error = %e, "Failed to deliver order notification");
        }
    }
    tracing::info!("Notification worker stopped");
}

async fn deliver(
    pool: &PgPool,
    email: Option<&EmailService>,
    notification: &Notification,
) -> Result<(), String> {
    let order_id = notification.order_id();
    let summary = OrderRepository::new(pool)
        .order_summary(order_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("order {order_id} vanished before notification"))?;

    let (subject, body) = match notification {
        Notification::OrderPlaced { .. } => (
            format!("Order #{order_id} confirmation"),
            confirmation_body(&summary),
        ),
        Notification::StatusChanged { from, to, .. } => (
            format!("Order #{order_id} is now {to}"),
            status_body(&summary, *from, *to),
        ),
    };

    match email {
        Some(service) => service
            .send_plain(&summary.user_email, &subject, body)
            .await
            .map_err(|e| e.to_string()),
        None => {
            tracing::info!(%order_id, to = %summary.user_email, %subject, "Email not configured, notification logged only");
            Ok(())
        }
    }
}

/// Plain-text confirmation listing every line, the total and the address.
fn confirmation_body(summary: &OrderSummary) -> String {
    let detail = &summary.detail;
    let mut body = format!(
        "Hello, {}!\n\nYour order #{} from {} has been placed.\n\nItems:\n",
        summary.user_name,
        detail.id,
        detail.created_at.format("%d.%m.%Y %H:%M"),
    );

    for line in &detail.line_items {
        body.push_str(&format!(
            "- {}: {} x {} = {}\n",
            line.product, line.quantity, line.price, line.line_total
        ));
    }
    body.push_str(&format!("\nOrder total: {}\n", detail.total));

    if let Some(contact) = &detail.contact {
        body.push_str(&format!(
            "\nDelivery address:\n{}\n\nContact phone: {}\n",
            contact.postal_line(),
            contact.phone
        ));
    }

    body.push_str("\nThank you for your order!\n");
    body
}

fn status_body(summary: &OrderSummary, from: OrderState, to: OrderState) -> String {
    format!(
        "Hello, {}!\n\nYour order #{} changed state: {} -> {}.\n",
        summary.user_name, summary.detail.id, from, to
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use orderflow_core::{
        ContactId, InventoryRecordId, LineItemId, OrderId, ShopId, UserId,
    };

    use crate::models::order::{OrderDetail, OrderLineView};
    use crate::models::DeliveryContact;

    use super::*;

    fn summary() -> OrderSummary {
        let price = Decimal::from(100);
        OrderSummary {
            detail: OrderDetail {
                id: OrderId::new(12),
                created_at: Utc.with_ymd_and_hms(2026, 8, 1, 10, 30, 0).single().expect("valid ts"),
                state: OrderState::Placed,
                contact: Some(DeliveryContact {
                    id: ContactId::new(1),
                    user_id: UserId::new(3),
                    city: "Kazan".into(),
                    street: "Bauman".into(),
                    house: "12".into(),
                    structure: String::new(),
                    building: String::new(),
                    apartment: "4".into(),
                    phone: "+79991234567".into(),
                }),
                line_items: vec![OrderLineView {
                    id: LineItemId::new(1),
                    inventory_record: InventoryRecordId::new(5),
                    product: "Smartphone".into(),
                    shop_id: ShopId::new(1),
                    shop: "Svyaznoy".into(),
                    quantity: 2,
                    price,
                    line_total: price * Decimal::from(2),
                }],
                total: Decimal::from(200),
            },
            user_email: "buyer@example.com".into(),
            user_name: "Ivan".into(),
        }
    }

    #[test]
    fn confirmation_lists_lines_total_and_address() {
        let body = confirmation_body(&summary());
        assert!(body.contains("Hello, Ivan!"));
        assert!(body.contains("order #12 from 01.08.2026 10:30"));
        assert!(body.contains("- Smartphone: 2 x 100 = 200"));
        assert!(body.contains("Order total: 200"));
        assert!(body.contains("Kazan, Bauman, house 12, apt. 4"));
        assert!(body.contains("+79991234567"));
    }

    #[test]
    fn status_body_names_both_states() {
        let body = status_body(&summary(), OrderState::Placed, OrderState::Canceled);
        assert!(body.contains("placed -> canceled"));
    }

    #[test]
    fn disconnected_notifier_drops_silently() {
        let notifier = Notifier::disconnected();
        // Must not panic or block.
        notifier.order_placed(OrderId::new(1));
        notifier.order_status_changed(OrderId::new(1), OrderState::Placed, OrderState::Canceled);
    }
}
