//! SQLite backend for the order engine.
mod sqlite_impl;

mod db;
pub use sqlite_impl::SqliteDatabase;
