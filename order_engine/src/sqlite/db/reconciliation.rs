use chrono::Utc;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{NewReconciliationEntry, ReconciliationEntry, ReconciliationReason};

pub async fn insert_entry(
    entry: NewReconciliationEntry,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationEntry, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO reconciliation_queue (
                reason,
                payment_reference,
                requested_status,
                user_id,
                amount,
                detail,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(entry.reason)
    .bind(entry.payment_reference)
    .bind(entry.requested_status)
    .bind(entry.user_id)
    .bind(entry.amount)
    .bind(entry.detail)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(entry)
}

/// Unresolved entries, oldest first.
pub async fn fetch_outstanding(
    reason: Option<ReconciliationReason>,
    conn: &mut SqliteConnection,
) -> Result<Vec<ReconciliationEntry>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM reconciliation_queue WHERE resolved_at IS NULL");
    if let Some(reason) = reason {
        builder.push(" AND reason = ");
        builder.push_bind(reason);
    }
    builder.push(" ORDER BY id ASC");
    let entries = builder.build_query_as::<ReconciliationEntry>().fetch_all(conn).await?;
    Ok(entries)
}

pub async fn fetch_entry(id: i64, conn: &mut SqliteConnection) -> Result<Option<ReconciliationEntry>, sqlx::Error> {
    let entry =
        sqlx::query_as("SELECT * FROM reconciliation_queue WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(entry)
}

/// Sets `resolved_at` if it is not set yet, and returns the entry. `None` if the entry does not exist.
pub async fn resolve_entry(id: i64, conn: &mut SqliteConnection) -> Result<Option<ReconciliationEntry>, sqlx::Error> {
    sqlx::query("UPDATE reconciliation_queue SET resolved_at = $1 WHERE id = $2 AND resolved_at IS NULL")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    fetch_entry(id, conn).await
}

pub async fn count_outstanding(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reconciliation_queue WHERE resolved_at IS NULL")
        .fetch_one(conn)
        .await?;
    Ok(count)
}
