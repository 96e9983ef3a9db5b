//! Database operations for the order service `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `app_user` / `auth_token` - Caller identification
//! - `shop` / `product` / `inventory_record` - Per-shop catalog and stock
//! - `delivery_contact` - Soft-deleted delivery addresses
//! - `customer_order` / `order_line_item` - Baskets and orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p orderflow-cli -- migrate
//! ```
//!
//! Reads that feed a mutation (checkout, cancellation, basket updates) take
//! `&mut PgConnection` so they can run inside the caller's transaction with
//! row locks held; plain reads take the pool.

pub mod contacts;
pub mod inventory;
pub mod orders;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use contacts::ContactRepository;
pub use orders::OrderRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate basket).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
