//! Caller identity resolved by the auth extractor.

use orderflow_core::UserId;

/// The authenticated caller of the current request.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CurrentUser {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Whether the user may use the administrator order route.
    pub is_staff: bool,
}
