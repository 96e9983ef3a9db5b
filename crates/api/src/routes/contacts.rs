//! Delivery contact handlers.
//!
//! Contacts are never hard-deleted: orders reference them for display long
//! after the caller retires an address, so removal flips `is_deleted` and
//! listings filter on it.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use orderflow_core::ContactId;
use serde::Deserialize;
use serde_json::json;

use crate::db::{ContactRepository, contacts::CreateContactInput};
use crate::error::ApiError;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Build the contact router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/user/contact",
        get(list_contacts).post(create_contact).delete(delete_contacts),
    )
}

/// `GET /user/contact` - the caller's live contacts.
async fn list_contacts(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let contacts = ContactRepository::new(state.pool()).list(user.id).await?;

    Ok(Json(json!({
        "status": true,
        "data": contacts,
    }))
    .into_response())
}

/// Request body for `POST /user/contact`. Optional address parts default to
/// empty strings.
#[derive(Debug, Deserialize)]
struct CreateContactBody {
    city: Option<String>,
    street: Option<String>,
    #[serde(default)]
    house: String,
    #[serde(default)]
    structure: String,
    #[serde(default)]
    building: String,
    #[serde(default)]
    apartment: String,
    phone: Option<String>,
}

fn required_field(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{name} is required")))
}

/// `POST /user/contact` - create a contact for the caller.
async fn create_contact(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateContactBody>,
) -> Result<Response, ApiError> {
    let input = CreateContactInput {
        city: required_field(body.city, "city")?,
        street: required_field(body.street, "street")?,
        house: body.house,
        structure: body.structure,
        building: body.building,
        apartment: body.apartment,
        phone: required_field(body.phone, "phone")?,
    };

    let contact = ContactRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": true,
            "message": "contact created",
            "data": contact,
        })),
    )
        .into_response())
}

/// `DELETE /user/contact` body: `{"items": "1,2"}` (contact IDs).
#[derive(Debug, Deserialize)]
struct DeleteContactsBody {
    items: Option<String>,
}

fn parse_contact_ids(raw: Option<&str>) -> Result<Vec<ContactId>, ApiError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("no items provided for deletion".to_string()))?;

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map(ContactId::new)
                .map_err(|_| ApiError::Validation("invalid ID list format".to_string()))
        })
        .collect()
}

/// `DELETE /user/contact` - soft-delete the caller's contacts.
async fn delete_contacts(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<DeleteContactsBody>,
) -> Result<Response, ApiError> {
    let ids = parse_contact_ids(body.items.as_deref())?;

    let deleted = ContactRepository::new(state.pool())
        .soft_delete(user.id, &ids)
        .await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("no matching contacts found".to_string()));
    }

    Ok(Json(json!({
        "status": true,
        "message": format!("deleted {deleted} contact(s)"),
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_field_trims_and_rejects_blank() {
        assert_eq!(
            required_field(Some("  Moscow ".to_string()), "city").expect("value"),
            "Moscow"
        );
        assert!(required_field(Some("   ".to_string()), "city").is_err());
        assert!(required_field(None, "city").is_err());
    }

    #[test]
    fn contact_id_list_parses() {
        let ids = parse_contact_ids(Some("4,5")).expect("parse");
        assert_eq!(ids, vec![ContactId::new(4), ContactId::new(5)]);
        assert!(parse_contact_ids(Some("4,b")).is_err());
        assert!(parse_contact_ids(None).is_err());
    }
}
