//! Order handlers: checkout, listing, detail and state transitions.
//!
//! `POST /order` is the checkout: it converts the caller's basket into a
//! placed order inside one transaction. `PUT /order/{id}` carries both the
//! owner's cancellation (`action: "cancel"`) and the administrator's state
//! moves (`state: "<target>"`); the state machine in `orderflow_core`
//! decides which moves are legal for whom.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use orderflow_core::{Actor, ContactId, OrderId, OrderState};

use crate::db::OrderRepository;
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::services::checkout;
use crate::state::AppState;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order", get(list_orders).post(place_order))
        .route("/order/{id}", get(order_detail).put(update_order))
}

/// `GET /order` - the caller's placed orders, newest first.
async fn list_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(json!({
        "status": true,
        "data": orders,
    }))
    .into_response())
}

/// Request body for `POST /order`.
#[derive(Debug, Deserialize)]
struct PlaceOrderBody {
    /// Delivery contact to attach to the order.
    contact: Option<ContactId>,
    /// Optional basket id; when present it must match the caller's basket.
    id: Option<OrderId>,
}

/// `POST /order` - convert the caller's basket into a placed order.
async fn place_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderBody>,
) -> Result<Response, ApiError> {
    let contact_id = body
        .contact
        .ok_or_else(|| ApiError::Validation("a delivery contact is required".to_string()))?;

    let order_id = checkout::place_order(
        state.pool(),
        state.notifier(),
        user.id,
        contact_id,
        body.id,
    )
    .await?;

    let detail = OrderRepository::new(state.pool())
        .order_detail(order_id, Some(user.id))
        .await?
        .ok_or_else(|| ApiError::Internal("order disappeared after checkout".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "order placed",
            "data": detail,
        })),
    )
        .into_response())
}

/// `GET /order/{id}` - one of the caller's orders, fully resolved.
async fn order_detail(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Response, ApiError> {
    let detail = OrderRepository::new(state.pool())
        .order_detail(order_id, Some(user.id))
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "data": detail,
    }))
    .into_response())
}

/// Request body for `PUT /order/{id}`.
///
/// Exactly one of the fields is expected: `action` for the owner flow
/// (currently only `"cancel"`), `state` for the administrator flow.
#[derive(Debug, Deserialize)]
struct UpdateOrderBody {
    action: Option<String>,
    state: Option<String>,
}

/// `PUT /order/{id}` - cancel (owner) or move to a new state (administrator).
async fn update_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateOrderBody>,
) -> Result<Response, ApiError> {
    let (actor, target) = match (body.action.as_deref(), body.state.as_deref()) {
        (None, Some(raw)) => {
            if !user.is_staff {
                return Err(ApiError::Unauthorized(
                    "administrator access required to set order state".to_string(),
                ));
            }
            let target: OrderState = raw
                .parse()
                .map_err(|_| ApiError::Validation(format!("unknown order state '{raw}'")))?;
            (Actor::Administrator, target)
        }
        (Some("cancel"), None) => (Actor::Owner, OrderState::Canceled),
        (Some(other), None) => {
            return Err(ApiError::Validation(format!("unknown action '{other}'")));
        }
        _ => {
            return Err(ApiError::Validation(
                "provide either an action or a target state".to_string(),
            ));
        }
    };

    let transition = checkout::transition_order(
        state.pool(),
        state.notifier(),
        user.id,
        actor,
        order_id,
        target,
    )
    .await?;

    let lookup_user = match actor {
        Actor::Owner => Some(user.id),
        Actor::Administrator => None,
    };
    let detail = OrderRepository::new(state.pool())
        .order_detail(order_id, lookup_user)
        .await?
        .ok_or_else(|| ApiError::Internal("order disappeared after transition".to_string()))?;

    Ok(Json(json!({
        "status": true,
        "message": format!(
            "order {} moved from {} to {}",
            transition.order_id, transition.from, transition.to
        ),
        "data": detail,
    }))
    .into_response())
}
