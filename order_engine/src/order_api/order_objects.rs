use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_common::Amount;

use crate::db_types::{LineItem, Order, OrderId, OrderStatusType, ProductId, UserId};

//--------------------------------------    PurchaseRequest    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl PurchaseItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// A request to buy a set of products. Prices are never part of the request; they are looked up in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub items: Vec<PurchaseItem>,
    /// When the client made the request. The idempotency key for the charge is derived from this, so a client
    /// retrying the same purchase must send the same value.
    pub requested_at: DateTime<Utc>,
}

impl PurchaseRequest {
    pub fn new(items: Vec<PurchaseItem>, requested_at: DateTime<Utc>) -> Self {
        Self { items, requested_at }
    }

    pub fn with_item(mut self, product_id: ProductId, quantity: i64) -> Self {
        self.items.push(PurchaseItem::new(product_id, quantity));
        self
    }
}

/// The result of a successful purchase. The order is always `pending` at this point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub order: Order,
    pub line_items: Vec<LineItem>,
}

//--------------------------------------    Purchase history   ---------------------------------------------------------
/// A line item together with a snapshot of the product as it is now. `price_at_purchase` is frozen, while
/// `current_price` is whatever the catalog says today. The product fields are `None` if the product no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_at_purchase: Amount,
    pub product_name: String,
    pub product_description: String,
    pub current_price: Option<Amount>,
    pub inventory_count: Option<i64>,
    pub product_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub order: Order,
    pub items: Vec<PurchasedItem>,
}

impl OrderHistoryEntry {
    /// The sum of the line items. This always equals `order.total_amount`.
    pub fn items_total(&self) -> Amount {
        self.items.iter().map(|i| i.price_at_purchase * i.quantity).sum()
    }
}

//--------------------------------------      Sales report     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub user_id: Option<UserId>,
    /// Only count orders with this status. `None` counts every order, whatever its status.
    pub status: Option<OrderStatusType>,
}

impl SalesQuery {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to, user_id: None, status: None }
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub total_quantity: i64,
    pub total_revenue: Amount,
}

//--------------------------------------  Replay summary       ---------------------------------------------------------
/// What happened when the operator replayed unmatched notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Entries whose order now exists, and that were applied and resolved.
    pub applied: Vec<i64>,
    /// Entries whose order now exists, but whose status conflicted with the order. These were resolved and re-queued
    /// as conflicting notifications.
    pub conflicts: Vec<i64>,
    /// Entries whose charge id still matches no order. They stay outstanding.
    pub still_unmatched: Vec<i64>,
}
