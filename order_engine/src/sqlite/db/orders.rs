use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
        Order,
        OrderId,
        OrderStatusChange,
        OrderStatusType,
        PaymentReference,
        UserId,
    },
    order_objects::{OrderHistoryEntry, PurchasedItem},
};

/// Inserts a new `pending` order using the given connection. This is not atomic on its own. Embed the call inside a
/// transaction along with the line items, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    order: NewOrder,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                total_amount,
                payment_reference,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(order.payment_reference)
    .bind(OrderStatusType::Pending)
    .bind(created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_line_item(
    order_id: OrderId,
    item: NewLineItem,
    conn: &mut SqliteConnection,
) -> Result<LineItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_line_items (order_id, product_id, quantity, price_at_purchase)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_at_purchase)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_payment_reference(
    reference: &PaymentReference,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Line items for the order, in insertion order.
pub async fn fetch_line_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_line_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Moves a `pending` order to `new_status` with a single conditional row mutation.
///
/// Returns `None` if no order has the reference, or if the order is no longer `pending`. Concurrent callers racing
/// on the same order cannot both succeed, since only one of them can observe `status = 'pending'`.
pub(crate) async fn update_pending_order_status(
    reference: &PaymentReference,
    new_status: OrderStatusType,
    updated_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = $2 WHERE payment_reference = $3 AND status = $4 RETURNING *",
    )
    .bind(new_status)
    .bind(updated_at)
    .bind(reference.as_str())
    .bind(OrderStatusType::Pending)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub(crate) async fn insert_status_change(
    order: &Order,
    old_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusChange, sqlx::Error> {
    let change = sqlx::query_as(
        r#"
            INSERT INTO order_status_changes (order_id, old_status, new_status, payment_reference, changed_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(old_status)
    .bind(order.status)
    .bind(order.payment_reference.as_str())
    .bind(order.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(change)
}

pub async fn fetch_status_changes(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusChange>, sqlx::Error> {
    let changes = sqlx::query_as("SELECT * FROM order_status_changes WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(changes)
}

/// Fetches every order for the user, most recent first, and attaches the line items of each one.
///
/// Orders and line items are read with two queries rather than a single join, and the items are grouped by their
/// order id. Each line item belongs to exactly one group, so nothing is duplicated or dropped.
/// Run this inside a transaction to read both tables from the same snapshot.
pub async fn purchase_history(
    user_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderHistoryEntry>, sqlx::Error> {
    let orders: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;
    let items: Vec<PurchasedItem> = sqlx::query_as(
        r#"
        SELECT
            li.id AS id,
            li.order_id AS order_id,
            li.product_id AS product_id,
            li.quantity AS quantity,
            li.price_at_purchase AS price_at_purchase,
            COALESCE(p.name, '') AS product_name,
            COALESCE(p.description, '') AS product_description,
            p.price AS current_price,
            p.inventory_count AS inventory_count,
            p.created_at AS product_created_at
        FROM order_line_items li
            JOIN orders o ON li.order_id = o.id
            LEFT JOIN products p ON li.product_id = p.id
        WHERE o.user_id = $1
        ORDER BY li.order_id, li.id"#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    trace!("🗃️ History for user {user_id}: {} orders, {} line items", orders.len(), items.len());
    let mut grouped: HashMap<OrderId, Vec<PurchasedItem>> = HashMap::with_capacity(orders.len());
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    let history = orders
        .into_iter()
        .map(|order| {
            let items = grouped.remove(&order.id).unwrap_or_default();
            OrderHistoryEntry { order, items }
        })
        .collect();
    Ok(history)
}
