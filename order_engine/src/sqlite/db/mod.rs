//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open a transaction and pass
//! `&mut *tx` as the need arises, without any other changes to the functions.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod orders;
pub mod products;
pub mod reconciliation;
pub mod reports;

/// Creates a connection pool. `timeout` bounds both the wait for a pooled connection and SQLite's busy handler, so a
/// locked database surfaces as an error rather than an indefinite wait.
pub async fn new_pool(url: &str, max_connections: u32, timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options =
        SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true).busy_timeout(timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}
