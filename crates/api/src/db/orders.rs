//! Database operations for orders, baskets and line items.
//!
//! Plain reads go through [`OrderRepository`] on the pool. Anything that
//! participates in the checkout/cancellation/basket transactions is a free
//! function over `&mut PgConnection` so the row locks taken by one step are
//! still held by the next.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use orderflow_core::{ContactId, InventoryRecordId, LineItemId, OrderId, OrderState, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderDetail, OrderLineView, OrderRow, OrderSummary};
use crate::models::{DeliveryContact, LockedLine};

const ORDER_COLUMNS: &str = "id, user_id, created_at, state, contact_id";

const LINE_VIEW_SELECT: &str = r"
    SELECT
        li.id,
        li.inventory_record_id AS inventory_record,
        p.name AS product,
        s.id AS shop_id,
        s.name AS shop,
        li.quantity,
        ir.price,
        (ir.price * li.quantity) AS line_total
    FROM order_line_item li
    JOIN inventory_record ir ON ir.id = li.inventory_record_id
    JOIN product p ON p.id = ir.product_id
    JOIN shop s ON s.id = ir.shop_id
";

/// Line view carrying its order id, for grouping list queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineViewRow {
    order_id: OrderId,
    #[sqlx(flatten)]
    line: OrderLineView,
}

/// Repository for order read operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The caller's open basket with resolved line items, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or stored state is invalid.
    pub async fn basket_detail(
        &self,
        user_id: UserId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE user_id = $1 AND state = 'basket'"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let order = Order::try_from(row)?;
        let lines = self.lines_for_order(order.id).await?;
        Ok(Some(OrderDetail::assemble(&order, None, lines)))
    }

    /// A single order with line items and contact; `user_id` restricts the
    /// lookup to the owner (pass `None` for administrative access).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or stored state is invalid.
    pub async fn order_detail(
        &self,
        order_id: OrderId,
        user_id: Option<UserId>,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE id = $1
              AND state <> 'basket'
              AND ($2::int IS NULL OR user_id = $2)
            "
        ))
        .bind(order_id)
        .bind(user_id.map(|u| u.as_i32()))
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let order = Order::try_from(row)?;
        let contact = self.contact_for(order.contact_id).await?;
        let lines = self.lines_for_order(order.id).await?;
        Ok(Some(OrderDetail::assemble(&order, contact, lines)))
    }

    /// The caller's placed orders (everything except the basket), newest
    /// first, fully resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or stored state is invalid.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE user_id = $1 AND state <> 'basket'
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.resolve_details(rows).await
    }

    /// Orders containing goods from the shop owned by `shop_user_id`
    /// (the partner fulfillment listing).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or stored state is invalid.
    pub async fn list_for_partner(
        &self,
        shop_user_id: UserId,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT DISTINCT o.id, o.user_id, o.created_at, o.state, o.contact_id
            FROM customer_order o
            JOIN order_line_item li ON li.order_id = o.id
            JOIN inventory_record ir ON ir.id = li.inventory_record_id
            JOIN shop s ON s.id = ir.shop_id
            WHERE s.user_id = $1 AND o.state <> 'basket'
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(shop_user_id)
        .fetch_all(self.pool)
        .await?;

        self.resolve_details(rows).await
    }

    /// Everything the notification worker needs about one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails or stored state is invalid.
    pub async fn order_summary(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let order = Order::try_from(row)?;

        let user = sqlx::query_as::<_, (String, String)>(
            "SELECT email, name FROM app_user WHERE id = $1",
        )
        .bind(order.user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {order_id} has no owning user"))
        })?;

        let contact = self.contact_for(order.contact_id).await?;
        let lines = self.lines_for_order(order.id).await?;
        Ok(Some(OrderSummary {
            detail: OrderDetail::assemble(&order, contact, lines),
            user_email: user.0,
            user_name: user.1,
        }))
    }

    async fn lines_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLineView>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderLineView>(&format!(
            "{LINE_VIEW_SELECT} WHERE li.order_id = $1 ORDER BY li.id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }

    async fn contact_for(
        &self,
        contact_id: Option<ContactId>,
    ) -> Result<Option<DeliveryContact>, RepositoryError> {
        let Some(contact_id) = contact_id else {
            return Ok(None);
        };
        // No is_deleted filter here: an order keeps displaying the address
        // it was placed with even after the contact is retired.
        let contact = sqlx::query_as::<_, DeliveryContact>(
            r"
            SELECT id, user_id, city, street, house, structure, building, apartment, phone
            FROM delivery_contact
            WHERE id = $1
            ",
        )
        .bind(contact_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(contact)
    }

    /// Resolve order rows into details with one grouped line query.
    async fn resolve_details(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        let orders: Vec<Order> = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<_, _>>()?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let line_rows = sqlx::query_as::<_, OrderLineViewRow>(&format!(
            r"
            SELECT li.order_id AS order_id,
                   li.id,
                   li.inventory_record_id AS inventory_record,
                   p.name AS product,
                   s.id AS shop_id,
                   s.name AS shop,
                   li.quantity,
                   ir.price,
                   (ir.price * li.quantity) AS line_total
            FROM order_line_item li
            JOIN inventory_record ir ON ir.id = li.inventory_record_id
            JOIN product p ON p.id = ir.product_id
            JOIN shop s ON s.id = ir.shop_id
            WHERE li.order_id = ANY($1)
            ORDER BY li.id
            "
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLineView>> = HashMap::new();
        for row in line_rows {
            by_order.entry(row.order_id).or_default().push(row.line);
        }

        let mut details = Vec::with_capacity(orders.len());
        for order in &orders {
            let contact = self.contact_for(order.contact_id).await?;
            let lines = by_order.remove(&order.id).unwrap_or_default();
            details.push(OrderDetail::assemble(order, contact, lines));
        }
        Ok(details)
    }
}

// =============================================================================
// Transaction-scoped operations
// =============================================================================

/// Fetch-or-create the user's basket order.
///
/// The partial unique index on `(user_id) WHERE state = 'basket'` makes this
/// safe against a concurrent first-add: the loser of the insert race retries
/// the select.
///
/// # Errors
///
/// Returns `RepositoryError` if the queries fail.
pub async fn get_or_create_basket(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        INSERT INTO customer_order (user_id, state)
        VALUES ($1, 'basket')
        ON CONFLICT (user_id) WHERE state = 'basket' DO NOTHING
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(row) = row {
        return Order::try_from(row);
    }

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM customer_order WHERE user_id = $1 AND state = 'basket'"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)?;

    Order::try_from(row)
}

/// Lock and return the user's basket order.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails or stored state is invalid.
pub async fn lock_basket(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        SELECT {ORDER_COLUMNS} FROM customer_order
        WHERE user_id = $1 AND state = 'basket'
        FOR UPDATE
        "
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Lock and return an order by id.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails or stored state is invalid.
pub async fn lock_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(conn)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Load an order's line items joined to inventory and shops, locking the
/// inventory rows.
///
/// `FOR UPDATE OF ir` is the heart of the checkout/cancellation transactions:
/// the sufficiency check and the quantity mutation that follow both happen
/// under this lock, so two concurrent checkouts cannot both pass the check
/// and jointly oversell.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<LockedLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, LockedLine>(
        r"
        SELECT
            li.id AS line_item_id,
            ir.id AS inventory_record_id,
            p.name AS product_name,
            s.id AS shop_id,
            s.name AS shop_name,
            s.accepts_orders AS shop_accepts_orders,
            ir.quantity AS on_hand,
            li.quantity AS requested
        FROM order_line_item li
        JOIN inventory_record ir ON ir.id = li.inventory_record_id
        JOIN product p ON p.id = ir.product_id
        JOIN shop s ON s.id = ir.shop_id
        WHERE li.order_id = $1
        ORDER BY ir.id
        FOR UPDATE OF ir
        ",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(lines)
}

/// Insert a line item or add to its quantity if the product is already in
/// the basket.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn upsert_line(
    conn: &mut PgConnection,
    order_id: OrderId,
    inventory_record_id: InventoryRecordId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_line_item (order_id, inventory_record_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (order_id, inventory_record_id)
        DO UPDATE SET quantity = order_line_item.quantity + EXCLUDED.quantity
        ",
    )
    .bind(order_id)
    .bind(inventory_record_id)
    .bind(quantity)
    .execute(conn)
    .await?;

    Ok(())
}

/// A basket line with its inventory row locked, for quantity updates.
#[derive(Debug, sqlx::FromRow)]
pub struct LineForUpdate {
    pub id: LineItemId,
    pub product_name: String,
    pub on_hand: i32,
}

/// Lock a basket line (and its inventory record) by line item id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_line_for_update(
    conn: &mut PgConnection,
    order_id: OrderId,
    line_item_id: LineItemId,
) -> Result<Option<LineForUpdate>, RepositoryError> {
    let row = sqlx::query_as::<_, LineForUpdate>(
        r"
        SELECT li.id, p.name AS product_name, ir.quantity AS on_hand
        FROM order_line_item li
        JOIN inventory_record ir ON ir.id = li.inventory_record_id
        JOIN product p ON p.id = ir.product_id
        WHERE li.id = $1 AND li.order_id = $2
        FOR UPDATE OF ir
        ",
    )
    .bind(line_item_id)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Overwrite a line item's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_line_quantity(
    conn: &mut PgConnection,
    line_item_id: LineItemId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE order_line_item SET quantity = $2 WHERE id = $1")
        .bind(line_item_id)
        .bind(quantity)
        .execute(conn)
        .await?;

    Ok(())
}

/// Delete the given line items from an order; returns how many went away.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
    line_item_ids: &[LineItemId],
) -> Result<u64, RepositoryError> {
    let ids: Vec<i32> = line_item_ids.iter().map(|id| id.as_i32()).collect();
    let result = sqlx::query("DELETE FROM order_line_item WHERE order_id = $1 AND id = ANY($2)")
        .bind(order_id)
        .bind(&ids)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Number of line items in an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_lines(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<i64, RepositoryError> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM order_line_item WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(conn)
            .await?;

    Ok(count.0)
}

/// Delete an (empty) order outright. Line items cascade.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn delete_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM customer_order WHERE id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Set an order's state.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_state(
    conn: &mut PgConnection,
    order_id: OrderId,
    state: OrderState,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE customer_order SET state = $2 WHERE id = $1")
        .bind(order_id)
        .bind(state.as_str())
        .execute(conn)
        .await?;

    Ok(())
}

/// Transition a basket into a placed order with its delivery contact.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn place(
    conn: &mut PgConnection,
    order_id: OrderId,
    contact_id: ContactId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE customer_order SET state = 'placed', contact_id = $2 WHERE id = $1")
        .bind(order_id)
        .bind(contact_id)
        .execute(conn)
        .await?;

    Ok(())
}
