//! Partner (shop-side) handlers.
//!
//! A partner is a user who owns a shop. The state toggle controls whether
//! the shop's goods can be added to baskets or checked out; the order
//! listing shows every order containing the shop's goods so the partner can
//! assemble them.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{OrderRepository, inventory};
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the partner router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/partner/state", put(set_state))
        .route("/partner/orders", get(list_orders))
}

/// Request body for `PUT /partner/state`.
#[derive(Debug, Deserialize)]
struct SetStateBody {
    state: Option<bool>,
}

/// `PUT /partner/state` - toggle whether the caller's shop accepts orders.
async fn set_state(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<SetStateBody>,
) -> Result<Response, ApiError> {
    let accepts = body
        .state
        .ok_or_else(|| ApiError::Validation("a boolean 'state' is required".to_string()))?;

    let updated = inventory::set_shop_accepts_orders(state.pool(), user.id, accepts).await?;
    if !updated {
        return Err(ApiError::NotFound("shop not found".to_string()));
    }

    Ok(Json(json!({
        "status": true,
        "message": if accepts {
            "shop is now accepting orders"
        } else {
            "shop is no longer accepting orders"
        },
    }))
    .into_response())
}

/// `GET /partner/orders` - orders containing goods from the caller's shop.
async fn list_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_partner(user.id)
        .await?;

    Ok(Json(json!({
        "status": true,
        "data": orders,
    }))
    .into_response())
}
