//! Database operations for inventory records and shop state.
//!
//! `adjust_quantity` is the only write path for `inventory_record.quantity`
//! in this service. It always runs on a transaction connection whose caller
//! has already locked the row (`FOR UPDATE`) and verified sufficiency; the
//! `CHECK (quantity >= 0)` constraint is the last line of defense.

use sqlx::{PgConnection, PgPool};

use orderflow_core::{InventoryRecordId, UserId};

use super::RepositoryError;
use crate::models::RecordForBasket;

/// Fetch an inventory record with its shop state and product name, for
/// validating a basket add.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn record_for_basket(
    conn: &mut PgConnection,
    id: InventoryRecordId,
) -> Result<Option<RecordForBasket>, RepositoryError> {
    let row = sqlx::query_as::<_, RecordForBasket>(
        r"
        SELECT
            ir.id,
            p.name AS product_name,
            s.id AS shop_id,
            s.name AS shop_name,
            s.accepts_orders AS shop_accepts_orders,
            ir.quantity,
            ir.price
        FROM inventory_record ir
        JOIN product p ON p.id = ir.product_id
        JOIN shop s ON s.id = ir.shop_id
        WHERE ir.id = $1
        ",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Add `delta` (positive or negative) to an inventory record's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the record does not exist and
/// `RepositoryError::Database` for other failures, including the non-negative
/// quantity constraint.
pub async fn adjust_quantity(
    conn: &mut PgConnection,
    id: InventoryRecordId,
    delta: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE inventory_record
        SET quantity = quantity + $2
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(delta)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Set whether the shop owned by `user_id` accepts orders.
///
/// Returns `false` when the user owns no shop.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_shop_accepts_orders(
    pool: &PgPool,
    user_id: UserId,
    accepts: bool,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE shop
        SET accepts_orders = $2
        WHERE user_id = $1
        ",
    )
    .bind(user_id)
    .bind(accepts)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
