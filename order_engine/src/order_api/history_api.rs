use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{LineItem, Order, OrderId, OrderStatusChange, UserId},
    order_api::{bounded, Deadlines},
    order_objects::{OrderHistoryEntry, ProductSales, SalesQuery},
    traits::{LedgerError, OrderLedger},
};

/// Read-only views over the ledger: purchase histories for users, and sales reports for staff.
pub struct HistoryApi<B> {
    db: B,
    deadlines: Deadlines,
}

impl<B> Debug for HistoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HistoryApi ({:?})", self.deadlines)
    }
}

impl<B> HistoryApi<B>
where B: OrderLedger
{
    pub fn new(db: B, deadlines: Deadlines) -> Self {
        Self { db, deadlines }
    }

    /// Every order the user has placed, newest first, each with only its own line items.
    pub async fn purchase_history(&self, user_id: UserId) -> Result<Vec<OrderHistoryEntry>, LedgerError> {
        let history = bounded(self.deadlines.ledger, self.db.purchase_history(user_id), LedgerError::Timeout).await?;
        debug!("🗃️ Fetched {} orders for user {user_id}", history.len());
        Ok(history)
    }

    /// The order with its line items, if it exists.
    pub async fn order_with_items(&self, id: OrderId) -> Result<Option<(Order, Vec<LineItem>)>, LedgerError> {
        let fetch = async {
            match self.db.fetch_order(id).await? {
                Some(order) => {
                    let items = self.db.fetch_line_items(order.id).await?;
                    Ok(Some((order, items)))
                },
                None => Ok(None),
            }
        };
        bounded(self.deadlines.ledger, fetch, LedgerError::Timeout).await
    }

    pub async fn status_history(&self, id: OrderId) -> Result<Vec<OrderStatusChange>, LedgerError> {
        bounded(self.deadlines.ledger, self.db.status_history(id), LedgerError::Timeout).await
    }

    /// Units sold and revenue per product inside the query window. An empty window (`from` after `to`) has no sales.
    pub async fn sales_report(&self, query: SalesQuery) -> Result<Vec<ProductSales>, LedgerError> {
        if query.from > query.to {
            debug!("🗃️ Sales report window is empty ({} > {})", query.from, query.to);
            return Ok(Vec::new());
        }
        let report = bounded(self.deadlines.ledger, self.db.sales_report(query), LedgerError::Timeout).await?;
        Ok(report)
    }
}
