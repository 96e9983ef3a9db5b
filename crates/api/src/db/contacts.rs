//! Database operations for delivery contacts.
//!
//! Every query here folds `is_deleted = FALSE` into its predicate. There is
//! deliberately no "fetch then check the flag" path.

use sqlx::{PgConnection, PgPool};

use orderflow_core::{ContactId, UserId};

use super::RepositoryError;
use crate::models::DeliveryContact;

/// Input for creating a delivery contact.
#[derive(Debug)]
pub struct CreateContactInput {
    pub city: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    pub phone: String,
}

/// Repository for delivery contact operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the caller's live contacts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<DeliveryContact>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryContact>(
            r"
            SELECT id, user_id, city, street, house, structure, building, apartment, phone
            FROM delivery_contact
            WHERE user_id = $1 AND NOT is_deleted
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Create a contact for the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &CreateContactInput,
    ) -> Result<DeliveryContact, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryContact>(
            r"
            INSERT INTO delivery_contact
                (user_id, city, street, house, structure, building, apartment, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, city, street, house, structure, building, apartment, phone
            ",
        )
        .bind(user_id)
        .bind(&input.city)
        .bind(&input.street)
        .bind(&input.house)
        .bind(&input.structure)
        .bind(&input.building)
        .bind(&input.apartment)
        .bind(&input.phone)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Soft-delete the caller's contacts with the given IDs.
    ///
    /// Returns the number of contacts flagged. Already deleted contacts are
    /// not counted again.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn soft_delete(
        &self,
        user_id: UserId,
        ids: &[ContactId],
    ) -> Result<u64, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let result = sqlx::query(
            r"
            UPDATE delivery_contact
            SET is_deleted = TRUE
            WHERE user_id = $1 AND id = ANY($2) AND NOT is_deleted
            ",
        )
        .bind(user_id)
        .bind(&ids)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Resolve a live contact owned by `user_id` inside an open transaction.
///
/// Returns `None` for absent, foreign, and soft-deleted contacts alike.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_active(
    conn: &mut PgConnection,
    contact_id: ContactId,
    user_id: UserId,
) -> Result<Option<DeliveryContact>, RepositoryError> {
    let row = sqlx::query_as::<_, DeliveryContact>(
        r"
        SELECT id, user_id, city, street, house, structure, building, apartment, phone
        FROM delivery_contact
        WHERE id = $1 AND user_id = $2 AND NOT is_deleted
        ",
    )
    .bind(contact_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}
