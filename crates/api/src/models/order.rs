//! Order and line item domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use orderflow_core::{ContactId, InventoryRecordId, LineItemId, OrderId, OrderState, ShopId, UserId};

use crate::db::RepositoryError;
use crate::models::contact::DeliveryContact;

/// An order header (a basket is an order whose state is `basket`).
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// When the order (basket) was created.
    pub created_at: DateTime<Utc>,
    /// Lifecycle state.
    pub state: OrderState,
    /// Delivery contact, set at checkout.
    pub contact_id: Option<ContactId>,
}

/// Raw `customer_order` row. State is stored as text and validated on read.
#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub state: String,
    pub contact_id: Option<ContactId>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let state = row.state.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            state,
            contact_id: row.contact_id,
        })
    }
}

/// A line item resolved against its product, shop and price, as serialized
/// in basket and order responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderLineView {
    /// Line item ID (the handle `PUT`/`DELETE /basket` operate on).
    pub id: LineItemId,
    /// Referenced inventory record.
    pub inventory_record: InventoryRecordId,
    /// Product display name.
    pub product: String,
    /// Shop the goods come from.
    pub shop_id: ShopId,
    /// Shop display name.
    pub shop: String,
    /// Ordered quantity.
    pub quantity: i32,
    /// Unit price at listing.
    pub price: Decimal,
    /// `quantity * price`.
    pub line_total: Decimal,
}

/// A fully resolved order as returned by the HTTP surface.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub state: OrderState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<DeliveryContact>,
    pub line_items: Vec<OrderLineView>,
    pub total: Decimal,
}

impl OrderDetail {
    /// Assemble a detail from its parts, computing the order total.
    #[must_use]
    pub fn assemble(
        order: &Order,
        contact: Option<DeliveryContact>,
        line_items: Vec<OrderLineView>,
    ) -> Self {
        let total = line_items.iter().map(|li| li.line_total).sum();
        Self {
            id: order.id,
            created_at: order.created_at,
            state: order.state,
            contact,
            line_items,
            total,
        }
    }
}

/// Everything the notification worker needs to format a confirmation.
#[derive(Debug)]
pub struct OrderSummary {
    pub detail: OrderDetail,
    /// Buyer's email address.
    pub user_email: String,
    /// Buyer's display name.
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: i32, qty: i32, price: i64) -> OrderLineView {
        let price = Decimal::from(price);
        OrderLineView {
            id: LineItemId::new(id),
            inventory_record: InventoryRecordId::new(id),
            product: format!("product-{id}"),
            shop_id: ShopId::new(1),
            shop: "shop".into(),
            quantity: qty,
            price,
            line_total: price * Decimal::from(qty),
        }
    }

    #[test]
    fn detail_total_sums_line_totals() {
        let order = Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            created_at: Utc::now(),
            state: OrderState::Placed,
            contact_id: None,
        };
        let detail = OrderDetail::assemble(&order, None, vec![line(1, 2, 100), line(2, 3, 50)]);
        assert_eq!(detail.total, Decimal::from(350));
    }

    #[test]
    fn order_row_rejects_unknown_state() {
        let row = OrderRow {
            id: OrderId::new(9),
            user_id: UserId::new(1),
            created_at: Utc::now(),
            state: "shipped".into(),
            contact_id: None,
        };
        let err = Order::try_from(row).expect_err("unknown state must not parse");
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
