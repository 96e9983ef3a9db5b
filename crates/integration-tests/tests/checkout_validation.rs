//! Checkout precondition tests against the service layer.
//!
//! `validate_availability` runs inside the checkout transaction on a locked
//! snapshot; these tests drive it with hand-built snapshots covering the
//! documented failure modes, and check the HTTP status each failure renders
//! with.

use axum::http::StatusCode;

use orderflow_api::error::ApiError;
use orderflow_api::models::LockedLine;
use orderflow_api::services::checkout::validate_availability;
use orderflow_core::{InventoryRecordId, LineItemId, ShopId};

fn line(
    id: i32,
    product: &str,
    shop: &str,
    accepts_orders: bool,
    on_hand: i32,
    requested: i32,
) -> LockedLine {
    LockedLine {
        line_item_id: LineItemId::new(id),
        inventory_record_id: InventoryRecordId::new(id),
        product_name: product.to_string(),
        shop_id: ShopId::new(id),
        shop_name: shop.to_string(),
        shop_accepts_orders: accepts_orders,
        on_hand,
        requested,
    }
}

#[test]
fn happy_path_basket_passes() {
    // Buyer wants 2 of a product with 10 on hand in an active shop.
    let basket = vec![line(1, "Laptop ThinkPad", "Demo Shop A", true, 10, 2)];
    assert!(validate_availability(&basket).is_ok());
}

#[test]
fn oversell_attempt_is_rejected_with_400() {
    // Buyer wants 20 of a product with 10 on hand.
    let basket = vec![line(1, "Laptop ThinkPad", "Demo Shop A", true, 10, 20)];
    let err = validate_availability(&basket).expect_err("oversell must fail");

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    let msg = err.to_string();
    assert!(msg.contains("insufficient quantity"));
    assert!(msg.contains("Laptop ThinkPad"));
    assert!(msg.contains("Demo Shop A"));
}

#[test]
fn one_inactive_shop_fails_the_whole_basket() {
    // A mixed basket: Shop A accepts orders, Shop B does not. Checkout is
    // all-or-nothing, so the active line cannot go through alone.
    let basket = vec![
        line(1, "Laptop ThinkPad", "Demo Shop A", true, 10, 1),
        line(2, "Wireless Mouse", "Demo Shop B", false, 100, 1),
    ];
    let err = validate_availability(&basket).expect_err("inactive shop must fail");

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    let msg = err.to_string();
    assert!(msg.contains("Demo Shop B"));
    assert!(msg.contains("not accepting orders"));
}

#[test]
fn inactive_shop_reported_before_stock_problems() {
    let basket = vec![line(1, "Laptop ThinkPad", "Demo Shop B", false, 0, 5)];
    let msg = validate_availability(&basket)
        .expect_err("must fail")
        .to_string();
    assert!(msg.contains("not accepting orders"));
    assert!(!msg.contains("insufficient"));
}

#[test]
fn buying_out_the_last_units_is_allowed() {
    // requested == on_hand leaves the record at zero, which the schema's
    // non-negative constraint permits.
    let basket = vec![line(1, "Monitor 27\"", "Demo Shop A", true, 8, 8)];
    assert!(validate_availability(&basket).is_ok());
}

#[test]
fn validation_and_policy_render_as_client_errors() {
    // The handlers surface missing-contact and empty-basket cases with
    // these variants; both must stay 4xx so buyers see the message.
    assert_eq!(
        ApiError::Validation("a delivery contact is required".into()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::Policy("basket is empty".into()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::NotFound("contact not found or deleted".into()).status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        ApiError::Transient("operation timed out waiting for inventory locks".into())
            .status_code(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
