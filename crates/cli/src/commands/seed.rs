//! Seed the database with demo data for local development.
//!
//! Creates two buyers, two shop partners with catalogs, an administrator and
//! a delivery contact, plus well-known auth tokens so the API can be poked
//! with curl right away. Idempotent: reruns update quantities instead of
//! duplicating rows.

use sqlx::PgPool;
use tracing::info;

use super::{CommandError, connect};

struct SeedUser {
    email: &'static str,
    name: &'static str,
    is_staff: bool,
    token: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "buyer@example.com",
        name: "Demo Buyer",
        is_staff: false,
        token: "demo-buyer-token",
    },
    SeedUser {
        email: "second-buyer@example.com",
        name: "Second Buyer",
        is_staff: false,
        token: "demo-buyer-2-token",
    },
    SeedUser {
        email: "partner-a@example.com",
        name: "Partner A",
        is_staff: false,
        token: "demo-partner-a-token",
    },
    SeedUser {
        email: "partner-b@example.com",
        name: "Partner B",
        is_staff: false,
        token: "demo-partner-b-token",
    },
    SeedUser {
        email: "admin@example.com",
        name: "Administrator",
        is_staff: true,
        token: "demo-admin-token",
    },
];

/// (product name, category, external id, quantity, price, rrc price)
const CATALOG_A: &[(&str, &str, i32, i32, &str, &str)] = &[
    ("Laptop ThinkPad", "Laptops", 1001, 10, "84990.00", "89990.00"),
    ("Smartphone Galaxy", "Phones", 1002, 25, "54990.00", "59990.00"),
    ("Monitor 27\"", "Displays", 1003, 8, "21990.00", "24990.00"),
];

const CATALOG_B: &[(&str, &str, i32, i32, &str, &str)] = &[
    ("Smartphone Galaxy", "Phones", 2001, 5, "52990.00", "59990.00"),
    ("Wireless Mouse", "Accessories", 2002, 100, "1490.00", "1990.00"),
];

/// Insert the demo dataset.
///
/// # Errors
///
/// Returns an error if `API_DATABASE_URL` is unset or a query fails.
pub async fn run() -> Result<(), CommandError> {
    info!("Connecting to order service database...");
    let pool = connect().await?;

    for user in USERS {
        let user_id = upsert_user(&pool, user).await?;
        upsert_token(&pool, user_id, user.token).await?;
    }

    let partner_a = user_id_by_email(&pool, "partner-a@example.com").await?;
    let partner_b = user_id_by_email(&pool, "partner-b@example.com").await?;

    let shop_a = upsert_shop(&pool, partner_a, "Demo Shop A", "https://shop-a.example.com").await?;
    let shop_b = upsert_shop(&pool, partner_b, "Demo Shop B", "https://shop-b.example.com").await?;

    for entry in CATALOG_A {
        upsert_inventory(&pool, shop_a, entry).await?;
    }
    for entry in CATALOG_B {
        upsert_inventory(&pool, shop_b, entry).await?;
    }

    let buyer = user_id_by_email(&pool, "buyer@example.com").await?;
    seed_contact(&pool, buyer).await?;

    info!("Demo data seeded");
    Ok(())
}

async fn upsert_user(pool: &PgPool, user: &SeedUser) -> Result<i32, CommandError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO app_user (email, name, is_staff)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name, is_staff = EXCLUDED.is_staff
        RETURNING id
        ",
    )
    .bind(user.email)
    .bind(user.name)
    .bind(user.is_staff)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn upsert_token(pool: &PgPool, user_id: i32, token: &str) -> Result<(), CommandError> {
    sqlx::query(
        r"
        INSERT INTO auth_token (token, user_id)
        VALUES ($1, $2)
        ON CONFLICT (token) DO NOTHING
        ",
    )
    .bind(token)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

async fn user_id_by_email(pool: &PgPool, email: &str) -> Result<i32, CommandError> {
    let (id,): (i32,) = sqlx::query_as("SELECT id FROM app_user WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

async fn upsert_shop(
    pool: &PgPool,
    user_id: i32,
    name: &str,
    url: &str,
) -> Result<i32, CommandError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO shop (name, url, user_id, accepts_orders)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, url = EXCLUDED.url
        RETURNING id
        ",
    )
    .bind(name)
    .bind(url)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn upsert_inventory(
    pool: &PgPool,
    shop_id: i32,
    entry: &(&str, &str, i32, i32, &str, &str),
) -> Result<(), CommandError> {
    let (name, category, external_id, quantity, price, rrc_price) = *entry;

    let (product_id,): (i32,) = sqlx::query_as(
        r"
        WITH existing AS (
            SELECT id FROM product WHERE name = $1
        ), inserted AS (
            INSERT INTO product (name, category)
            SELECT $1, $2
            WHERE NOT EXISTS (SELECT 1 FROM existing)
            RETURNING id
        )
        SELECT id FROM existing UNION ALL SELECT id FROM inserted
        ",
    )
    .bind(name)
    .bind(category)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r"
        INSERT INTO inventory_record (product_id, shop_id, external_id, quantity, price, rrc_price)
        VALUES ($1, $2, $3, $4, $5::numeric, $6::numeric)
        ON CONFLICT (product_id, shop_id, external_id)
        DO UPDATE SET quantity = EXCLUDED.quantity, price = EXCLUDED.price,
                      rrc_price = EXCLUDED.rrc_price
        ",
    )
    .bind(product_id)
    .bind(shop_id)
    .bind(external_id)
    .bind(quantity)
    .bind(price)
    .bind(rrc_price)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_contact(pool: &PgPool, user_id: i32) -> Result<(), CommandError> {
    let exists: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM delivery_contact WHERE user_id = $1 AND NOT is_deleted LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    if exists.is_some() {
        return Ok(());
    }

    sqlx::query(
        r"
        INSERT INTO delivery_contact (user_id, city, street, house, apartment, phone)
        VALUES ($1, 'Kazan', 'Bauman', '12', '4', '+79991234567')
        ",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}
