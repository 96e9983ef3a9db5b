//! Basket handlers: view, add, update, remove.
//!
//! Adding is best-effort per entry (bad entries are reported, good ones
//! applied) but rolls the whole call back when nothing could be added, so an
//! implicitly created basket never persists empty. Updating is all-or-nothing.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use orderflow_core::{InventoryRecordId, LineItemId};

use crate::db::{OrderRepository, inventory, orders};
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::routes::parse_items;
use crate::state::AppState;

/// Build the basket router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/basket",
        get(view_basket)
            .post(add_items)
            .put(update_items)
            .delete(remove_items),
    )
}

/// Request body whose `items` field is decoded per-operation.
#[derive(Debug, Deserialize)]
struct ItemsBody {
    items: Option<serde_json::Value>,
}

/// One entry of a `POST /basket` payload.
#[derive(Debug, Deserialize)]
struct AddItem {
    inventory_record: InventoryRecordId,
    quantity: i32,
}

/// One entry of a `PUT /basket` payload.
#[derive(Debug, Deserialize)]
struct UpdateItem {
    id: LineItemId,
    quantity: i32,
}

/// `GET /basket` - the caller's basket, or an explicit empty marker.
async fn view_basket(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let detail = OrderRepository::new(state.pool())
        .basket_detail(user.id)
        .await?;

    Ok(detail.map_or_else(
        || {
            (
                StatusCode::OK,
                Json(json!({ "status": false, "error": "basket is empty" })),
            )
                .into_response()
        },
        |detail| Json(detail).into_response(),
    ))
}

/// `POST /basket` - add items to the basket, creating it if needed.
async fn add_items(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ItemsBody>,
) -> Result<Response, ApiError> {
    let items: Vec<AddItem> = parse_items(body.items)?;

    let mut tx = state.pool().begin().await?;
    let basket = orders::get_or_create_basket(&mut *tx, user.id).await?;

    let mut errors = Vec::new();
    let mut applied = 0u32;

    for item in &items {
        if item.quantity <= 0 {
            errors.push(format!(
                "inventory record {}: quantity must be positive",
                item.inventory_record
            ));
            continue;
        }

        match inventory::record_for_basket(&mut *tx, item.inventory_record).await? {
            None => errors.push(format!(
                "inventory record {} not found",
                item.inventory_record
            )),
            Some(record) if !record.shop_accepts_orders => errors.push(format!(
                "shop {} is not accepting orders",
                record.shop_name
            )),
            Some(record) if record.quantity < item.quantity => errors.push(format!(
                "insufficient quantity of {} in shop {}",
                record.product_name, record.shop_name
            )),
            Some(record) => {
                orders::upsert_line(&mut *tx, basket.id, record.id, item.quantity).await?;
                applied += 1;
            }
        }
    }

    if applied == 0 {
        // Nothing went in; rolling back also removes a basket this call
        // implicitly created, so no empty orphan survives.
        tx.rollback().await?;
        return Err(ApiError::Policy(format!(
            "no items were added to the basket: {}",
            errors.join("; ")
        )));
    }
    tx.commit().await?;

    let detail = OrderRepository::new(state.pool())
        .basket_detail(user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("basket disappeared after add".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": format!("added {applied} item(s) to the basket"),
            "data": detail,
            "errors": errors,
        })),
    )
        .into_response())
}

/// `PUT /basket` - overwrite line item quantities, all-or-nothing.
async fn update_items(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<ItemsBody>,
) -> Result<Response, ApiError> {
    let items: Vec<UpdateItem> = parse_items(body.items)?;

    let mut tx = state.pool().begin().await?;
    let basket = orders::lock_basket(&mut *tx, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("basket not found".to_string()))?;

    for item in &items {
        if item.quantity <= 0 {
            return Err(ApiError::Validation(format!(
                "line item {}: quantity must be positive",
                item.id
            )));
        }

        let line = orders::lock_line_for_update(&mut *tx, basket.id, item.id)
            .await?
            .ok_or_else(|| {
                ApiError::Validation(format!("line item {} not found in basket", item.id))
            })?;

        if line.on_hand < item.quantity {
            return Err(ApiError::Policy(format!(
                "insufficient quantity of {}",
                line.product_name
            )));
        }
        orders::set_line_quantity(&mut *tx, item.id, item.quantity).await?;
    }
    tx.commit().await?;

    let detail = OrderRepository::new(state.pool())
        .basket_detail(user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("basket disappeared after update".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "message": "basket updated",
        "data": detail,
    }))
    .into_response())
}

/// `DELETE /basket` body: `{"items": "1,2,3"}` (line item IDs).
#[derive(Debug, Deserialize)]
struct RemoveBody {
    items: Option<String>,
}

/// Parse the comma-separated ID list of a `DELETE /basket` body.
fn parse_id_list(raw: Option<&str>) -> Result<Vec<LineItemId>, ApiError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("no items provided for deletion".to_string()))?;

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map(LineItemId::new)
                .map_err(|_| ApiError::Validation("invalid ID list format".to_string()))
        })
        .collect()
}

/// `DELETE /basket` - remove line items; an emptied basket is deleted.
async fn remove_items(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<RemoveBody>,
) -> Result<Response, ApiError> {
    let ids = parse_id_list(body.items.as_deref())?;

    let mut tx = state.pool().begin().await?;
    let basket = orders::lock_basket(&mut *tx, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("basket not found".to_string()))?;

    let deleted = orders::delete_lines(&mut *tx, basket.id, &ids).await?;
    let remaining = orders::count_lines(&mut *tx, basket.id).await?;
    if remaining == 0 {
        orders::delete_order(&mut *tx, basket.id).await?;
    }
    tx.commit().await?;

    if remaining == 0 {
        return Ok(Json(json!({
            "status": true,
            "message": format!("deleted {deleted} item(s), the basket is now empty"),
        }))
        .into_response());
    }

    let detail = OrderRepository::new(state.pool())
        .basket_detail(user.id)
        .await?
        .ok_or_else(|| ApiError::Internal("basket disappeared after delete".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "message": format!("deleted {deleted} item(s)"),
        "data": detail,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_list_parses_and_trims() {
        let ids = parse_id_list(Some("1, 2,3")).expect("parse");
        assert_eq!(
            ids,
            vec![LineItemId::new(1), LineItemId::new(2), LineItemId::new(3)]
        );
    }

    #[test]
    fn id_list_rejects_garbage_and_blank() {
        assert!(parse_id_list(None).is_err());
        assert!(parse_id_list(Some("")).is_err());
        assert!(parse_id_list(Some("1,x")).is_err());
    }
}
