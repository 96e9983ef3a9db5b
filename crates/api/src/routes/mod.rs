//! HTTP surface of the order service.
//!
//! - `/basket` - basket view and mutations
//! - `/order` - checkout, listings and state transitions
//! - `/user/contact` - delivery contact management
//! - `/partner/*` - shop-side state toggle and fulfillment listing

pub mod basket;
pub mod contacts;
pub mod orders;
pub mod partner;

use axum::Router;

use crate::state::AppState;

/// Build the combined application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(basket::router())
        .merge(orders::router())
        .merge(contacts::router())
        .merge(partner::router())
}

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decode an `items` payload that may arrive as a JSON array or as a string
/// containing one (clients of the original service sent both).
///
/// # Errors
///
/// Returns `ApiError::Validation` when the field is missing, empty or
/// unparsable.
pub(crate) fn parse_items<T: DeserializeOwned>(
    items: Option<serde_json::Value>,
) -> Result<Vec<T>, ApiError> {
    let items = items.ok_or_else(|| {
        ApiError::Validation("no items provided for processing".to_string())
    })?;

    let parsed: Vec<T> = match items {
        serde_json::Value::Array(_) => serde_json::from_value(items)
            .map_err(|_| ApiError::Validation("invalid items format".to_string()))?,
        serde_json::Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|_| ApiError::Validation("invalid items format".to_string()))?,
        _ => return Err(ApiError::Validation("invalid items format".to_string())),
    };

    if parsed.is_empty() {
        return Err(ApiError::Validation(
            "no items provided for processing".to_string(),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i32,
        quantity: i32,
    }

    #[test]
    fn accepts_array_payloads() {
        let items: Vec<Item> =
            parse_items(Some(json!([{"id": 1, "quantity": 2}]))).expect("array form");
        assert_eq!(items, vec![Item { id: 1, quantity: 2 }]);
    }

    #[test]
    fn accepts_json_string_payloads() {
        let items: Vec<Item> =
            parse_items(Some(json!("[{\"id\": 3, \"quantity\": 5}]"))).expect("string form");
        assert_eq!(items, vec![Item { id: 3, quantity: 5 }]);
    }

    #[test]
    fn rejects_missing_empty_and_malformed() {
        assert!(parse_items::<Item>(None).is_err());
        assert!(parse_items::<Item>(Some(json!([]))).is_err());
        assert!(parse_items::<Item>(Some(json!(42))).is_err());
        assert!(parse_items::<Item>(Some(json!("not json"))).is_err());
    }
}
