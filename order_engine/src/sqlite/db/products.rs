use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, ProductId};

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Seeds a product. The catalog service owns the table in production, so this is only used by tests and tooling.
pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let now = Utc::now();
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, inventory_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.inventory_count)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}
