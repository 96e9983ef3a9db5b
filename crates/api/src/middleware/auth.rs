//! Authentication extractors.
//!
//! Token issuance and session management live outside this service; callers
//! present `Authorization: Token <key>` (the `Bearer` scheme is accepted as
//! an alias) and the extractor resolves it against the `auth_token` table.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires an authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a request cannot be authenticated.
pub struct AuthRejection(ApiError);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve_user(state: &AppState, parts: &Parts) -> Result<CurrentUser, AuthRejection> {
    let token = bearer_token(parts).ok_or_else(|| {
        AuthRejection(ApiError::Unauthorized(
            "authentication credentials were not provided".to_string(),
        ))
    })?;

    let user = sqlx::query_as::<_, CurrentUser>(
        r"
        SELECT u.id, u.email, u.name, u.is_staff
        FROM auth_token t
        JOIN app_user u ON u.id = t.user_id
        WHERE t.token = $1
        ",
    )
    .bind(token)
    .fetch_optional(state.pool())
    .await
    .map_err(|e| AuthRejection(e.into()))?;

    user.ok_or_else(|| AuthRejection(ApiError::Unauthorized("invalid token".to_string())))
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(state, parts).await?;
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/basket");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(Body::empty()).expect("request").into_parts();
        parts
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        let parts = parts_with_auth(Some("Token abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));

        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("abc123"))), None);
        assert_eq!(bearer_token(&parts_with_auth(Some("Token "))), None);
    }
}
