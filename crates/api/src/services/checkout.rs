//! Checkout and cancellation transactions.
//!
//! Both operations follow the same shape: open one database transaction,
//! lock the order row and the inventory rows its line items reference,
//! validate against the locked snapshot, mutate, commit. Any validation
//! failure aborts the whole transaction, so a caller either sees a fully
//! applied result or untouched stock. Notifications are enqueued only after
//! commit and never feed back into the outcome.

use sqlx::PgPool;

use orderflow_core::{Actor, ContactId, OrderId, OrderState, UserId};

use crate::db::{contacts, inventory, orders};
use crate::error::ApiError;
use crate::models::LockedLine;
use crate::services::notifications::Notifier;

/// Validate a locked basket snapshot against shop activity and stock.
///
/// Order of checks matches the checkout contract: inactive shops are
/// reported first (all of them, by name), then the first insufficient
/// product. Pure function; the caller holds the row locks.
///
/// # Errors
///
/// Returns `ApiError::Policy` describing the first failed check.
pub fn validate_availability(lines: &[LockedLine]) -> Result<(), ApiError> {
    let mut inactive: Vec<&str> = lines
        .iter()
        .filter(|l| !l.shop_accepts_orders)
        .map(|l| l.shop_name.as_str())
        .collect();
    inactive.sort_unstable();
    inactive.dedup();

    if !inactive.is_empty() {
        return Err(ApiError::Policy(format!(
            "cannot place the order, the following shops are not accepting orders: {}",
            inactive.join(", ")
        )));
    }

    for line in lines {
        if line.on_hand < line.requested {
            return Err(ApiError::Policy(format!(
                "insufficient quantity of {} in shop {}",
                line.product_name, line.shop_name
            )));
        }
    }

    Ok(())
}

/// Convert the caller's basket into a placed order.
///
/// `basket_id`, when supplied by the client, must match the basket actually
/// found; the basket itself is always resolved through the caller, never
/// trusted from the body.
///
/// # Errors
///
/// - `ApiError::NotFound` - no basket, or the contact is absent/foreign/deleted
/// - `ApiError::Policy` - empty basket, inactive shop, insufficient stock
/// - `ApiError::Transient` / `ApiError::Database` - lock or query failures
pub async fn place_order(
    pool: &PgPool,
    notifier: &Notifier,
    user_id: UserId,
    contact_id: ContactId,
    basket_id: Option<OrderId>,
) -> Result<OrderId, ApiError> {
    let mut tx = pool.begin().await?;

    let basket = orders::lock_basket(&mut *tx, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("basket not found".to_string()))?;
    if basket_id.is_some_and(|id| id != basket.id) {
        return Err(ApiError::NotFound("basket not found".to_string()));
    }

    let contact = contacts::find_active(&mut *tx, contact_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("contact not found or deleted".to_string()))?;

    let lines = orders::lock_lines(&mut *tx, basket.id).await?;
    if lines.is_empty() {
        return Err(ApiError::Policy("basket is empty".to_string()));
    }

    validate_availability(&lines)?;

    // All checks passed under lock: decrement and place as one unit.
    for line in &lines {
        inventory::adjust_quantity(&mut *tx, line.inventory_record_id, -line.requested).await?;
    }
    orders::place(&mut *tx, basket.id, contact.id).await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %basket.id,
        user_id = %user_id,
        lines = lines.len(),
        "Order placed"
    );
    notifier.order_placed(basket.id);

    Ok(basket.id)
}

/// Result of a status transition.
#[derive(Debug)]
pub struct Transition {
    pub order_id: OrderId,
    pub from: OrderState,
    pub to: OrderState,
}

/// Move an order to a new state on behalf of `actor`, restoring inventory
/// when the move enters `canceled`.
///
/// For owners the order must belong to `user_id`; administrators may touch
/// any order. The state-machine check runs on the locked order row, so a
/// concurrent transition serializes behind this one and then fails its own
/// precondition instead of double-applying.
///
/// # Errors
///
/// - `ApiError::NotFound` - order absent, still a basket, or not owned
/// - `ApiError::Policy` - the transition is not permitted from the current state
/// - `ApiError::Transient` / `ApiError::Database` - lock or query failures
pub async fn transition_order(
    pool: &PgPool,
    notifier: &Notifier,
    user_id: UserId,
    actor: Actor,
    order_id: OrderId,
    target: OrderState,
) -> Result<Transition, ApiError> {
    let mut tx = pool.begin().await?;

    let order = orders::lock_order(&mut *tx, order_id)
        .await?
        .filter(|o| o.state != OrderState::Basket)
        .filter(|o| actor == Actor::Administrator || o.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    order
        .state
        .check_transition(target, actor)
        .map_err(|e| ApiError::Policy(e.to_string()))?;

    if order.state.restores_inventory(target) {
        let lines = orders::lock_lines(&mut *tx, order.id).await?;
        for line in &lines {
            inventory::adjust_quantity(&mut *tx, line.inventory_record_id, line.requested).await?;
        }
    }
    orders::set_state(&mut *tx, order.id, target).await?;

    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = %order.state,
        to = %target,
        "Order state changed"
    );
    notifier.order_status_changed(order.id, order.state, target);

    Ok(Transition {
        order_id: order.id,
        from: order.state,
        to: target,
    })
}

#[cfg(test)]
mod tests {
    use orderflow_core::{InventoryRecordId, LineItemId, ShopId};

    use super::*;

    fn line(shop: (&str, bool), on_hand: i32, requested: i32) -> LockedLine {
        LockedLine {
            line_item_id: LineItemId::new(1),
            inventory_record_id: InventoryRecordId::new(1),
            product_name: "Laptop ThinkPad".to_string(),
            shop_id: ShopId::new(1),
            shop_name: shop.0.to_string(),
            shop_accepts_orders: shop.1,
            on_hand,
            requested,
        }
    }

    #[test]
    fn passes_when_stock_and_shops_allow() {
        // Scenario A precondition: qty 10 on hand, 2 requested.
        let lines = vec![line(("Shop A", true), 10, 2)];
        assert!(validate_availability(&lines).is_ok());
    }

    #[test]
    fn rejects_insufficient_stock_naming_product() {
        // Scenario B: 20 requested against 10 on hand.
        let lines = vec![line(("Shop A", true), 10, 20)];
        let err = validate_availability(&lines).expect_err("must reject");
        assert!(matches!(err, ApiError::Policy(_)));
        let msg = err.to_string();
        assert!(msg.contains("insufficient quantity"));
        assert!(msg.contains("Laptop ThinkPad"));
    }

    #[test]
    fn rejects_inactive_shop_naming_it() {
        // Scenario C: Shop A active, Shop B inactive; the whole basket fails
        // and Shop B is named.
        let lines = vec![line(("Shop A", true), 10, 1), line(("Shop B", false), 10, 1)];
        let err = validate_availability(&lines).expect_err("must reject");
        let msg = err.to_string();
        assert!(msg.contains("Shop B"));
        assert!(!msg.contains("Shop A,"));
    }

    #[test]
    fn inactive_shops_are_reported_before_stock() {
        // An inactive shop and an insufficient line at once: the shop error
        // wins, matching the checkout step order.
        let lines = vec![line(("Shop B", false), 0, 5)];
        let msg = validate_availability(&lines)
            .expect_err("must reject")
            .to_string();
        assert!(msg.contains("not accepting orders"));
    }

    #[test]
    fn names_each_inactive_shop_once() {
        let lines = vec![
            line(("Shop B", false), 10, 1),
            line(("Shop B", false), 10, 1),
            line(("Shop C", false), 10, 1),
        ];
        let msg = validate_availability(&lines)
            .expect_err("must reject")
            .to_string();
        assert!(msg.contains("Shop B, Shop C"));
        assert_eq!(msg.matches("Shop B").count(), 1);
    }

    #[test]
    fn exact_stock_is_sufficient() {
        let lines = vec![line(("Shop A", true), 5, 5)];
        assert!(validate_availability(&lines).is_ok());
    }
}
