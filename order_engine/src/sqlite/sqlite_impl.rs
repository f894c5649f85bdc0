//! `SqliteDatabase` is the SQLite backend for the order engine.
//!
//! It implements [`OrderLedger`], [`CatalogReader`] and [`ReconciliationQueue`]. Each trait method that touches more
//! than one row runs inside its own transaction.
use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, products, reconciliation, reports};
use crate::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
        NewProduct,
        NewReconciliationEntry,
        Order,
        OrderId,
        OrderStatusChange,
        OrderStatusType,
        PaymentReference,
        Product,
        ProductId,
        ReconciliationEntry,
        ReconciliationReason,
        UserId,
    },
    order_objects::{OrderHistoryEntry, ProductSales, SalesQuery},
    traits::{
        CatalogError,
        CatalogReader,
        LedgerError,
        OrderLedger,
        ReconciliationQueue,
        ReconciliationQueueError,
        StatusUpdate,
    },
};

/// The default deadline for acquiring a connection, and for SQLite's busy handler.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_timeout(url, max_connections, DEFAULT_LEDGER_TIMEOUT).await
    }

    pub async fn new_with_timeout(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, timeout).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Runs the embedded migrations against the database.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Adds a product to the catalog table. The catalog is maintained elsewhere in production, so this is meant for
    /// seeding test and demo databases.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product {} ({}) added to the catalog at {}", product.id, product.name, product.price);
        Ok(product)
    }
}

impl OrderLedger for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(
        &self,
        order: NewOrder,
        line_items: Vec<NewLineItem>,
    ) -> Result<(Order, Vec<LineItem>), LedgerError> {
        let reference = order.payment_reference.clone();
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, Utc::now(), &mut tx).await.map_err(|e| {
            let duplicate = e.as_database_error().map(|d| d.is_unique_violation()).unwrap_or(false);
            if duplicate {
                LedgerError::DuplicatePaymentReference(reference.clone())
            } else {
                LedgerError::from(e)
            }
        })?;
        let mut items = Vec::with_capacity(line_items.len());
        for item in line_items {
            // Dropping `tx` on the error path rolls back the order insert along with any earlier items
            let item = orders::insert_line_item(order.id, item, &mut tx).await.map_err(|e| {
                warn!("🗃️ Could not insert line item for order {}. Rolling back. {e}", order.id);
                LedgerError::from(e)
            })?;
            items.push(item);
        }
        tx.commit().await?;
        debug!("🗃️ Order {} for user {} saved with {} line items ({})", order.id, order.user_id, items.len(), reference);
        Ok((order, items))
    }

    async fn update_status_by_payment_reference(
        &self,
        reference: &PaymentReference,
        new_status: OrderStatusType,
    ) -> Result<StatusUpdate, LedgerError> {
        if !new_status.is_terminal() {
            return Err(LedgerError::InvalidTargetStatus(new_status));
        }
        let mut tx = self.pool.begin().await?;
        let result = match orders::update_pending_order_status(reference, new_status, Utc::now(), &mut tx).await? {
            Some(order) => {
                orders::insert_status_change(&order, OrderStatusType::Pending, &mut tx).await?;
                debug!("🗃️ Order {} moved from pending to {new_status} ({reference})", order.id);
                StatusUpdate::Updated { old: OrderStatusType::Pending, order }
            },
            None => match orders::fetch_order_by_payment_reference(reference, &mut tx).await? {
                None => return Err(LedgerError::NotFound(reference.clone())),
                Some(order) if order.status == new_status => {
                    trace!("🗃️ Order {} is already {new_status}. Nothing to do.", order.id);
                    StatusUpdate::Unchanged(order)
                },
                Some(order) => {
                    return Err(LedgerError::IllegalTransition {
                        id: order.id,
                        current: order.status,
                        requested: new_status,
                    })
                },
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn purchase_history(&self, user_id: UserId) -> Result<Vec<OrderHistoryEntry>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let history = orders::purchase_history(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(history)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_payment_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order_id: OrderId) -> Result<Vec<LineItem>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn status_history(&self, order_id: OrderId) -> Result<Vec<OrderStatusChange>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let changes = orders::fetch_status_changes(order_id, &mut conn).await?;
        Ok(changes)
    }

    async fn sales_report(&self, query: SalesQuery) -> Result<Vec<ProductSales>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let report = reports::sales_report(query, &mut conn).await?;
        Ok(report)
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogReader for SqliteDatabase {
    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(id, &mut conn).await?.ok_or(CatalogError::ProductNotFound(id))
    }
}

impl ReconciliationQueue for SqliteDatabase {
    async fn push_entry(&self, entry: NewReconciliationEntry) -> Result<ReconciliationEntry, ReconciliationQueueError> {
        let mut conn = self.pool.acquire().await?;
        let entry = reconciliation::insert_entry(entry, &mut conn).await?;
        debug!("🗃️ Reconciliation entry #{} ({}) recorded for {}", entry.id, entry.reason, entry.payment_reference);
        Ok(entry)
    }

    async fn outstanding_entries(
        &self,
        reason: Option<ReconciliationReason>,
    ) -> Result<Vec<ReconciliationEntry>, ReconciliationQueueError> {
        let mut conn = self.pool.acquire().await?;
        let entries = reconciliation::fetch_outstanding(reason, &mut conn).await?;
        Ok(entries)
    }

    async fn resolve_entry(&self, id: i64) -> Result<ReconciliationEntry, ReconciliationQueueError> {
        let mut tx = self.pool.begin().await?;
        let entry =
            reconciliation::resolve_entry(id, &mut tx).await?.ok_or(ReconciliationQueueError::EntryNotFound(id))?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn count_outstanding(&self) -> Result<i64, ReconciliationQueueError> {
        let mut conn = self.pool.acquire().await?;
        let count = reconciliation::count_outstanding(&mut conn).await?;
        Ok(count)
    }
}
