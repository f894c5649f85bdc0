use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use storefront_common::Amount;
use thiserror::Error;

//--------------------------------------        UserId         ---------------------------------------------------------
/// The id of an authenticated user, as supplied by the credential/session layer. The engine trusts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The ledger-assigned order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   PaymentReference    ---------------------------------------------------------
/// The charge id assigned by the payment gateway. It is the key that the reconciliation listener uses to find orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct PaymentReference(pub String);

impl PaymentReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PaymentReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PaymentReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for PaymentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been recorded and a charge was created for it. The outcome of the charge is not known yet.
    Pending,
    /// The payment gateway reported that the charge succeeded.
    Paid,
    /// The payment gateway reported that the charge failed.
    Failed,
}

impl OrderStatusType {
    /// `Paid` and `Failed` are terminal. An order never leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
/// A snapshot of a catalog product at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Amount,
    /// Read for display only. Stock is never reserved or decremented by a purchase.
    pub inventory_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Amount,
    pub inventory_count: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Amount) -> Self {
        Self { name: name.into(), description: String::default(), price, inventory_count: 0 }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_inventory(mut self, count: i64) -> Self {
        self.inventory_count = count;
        self
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
/// An order that has been priced and charged, and is ready to be written to the ledger.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    /// Always computed from the line items on the server. Never supplied by the client.
    pub total_amount: Amount,
    /// The gateway charge id for this order.
    pub payment_reference: PaymentReference,
}

impl NewOrder {
    pub fn new(user_id: UserId, total_amount: Amount, payment_reference: PaymentReference) -> Self {
        Self { user_id, total_amount, payment_reference }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Amount,
    pub payment_reference: PaymentReference,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewLineItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// A frozen copy of the catalog price when the order was priced.
    pub price_at_purchase: Amount,
}

impl NewLineItem {
    pub fn new(product_id: ProductId, quantity: i64, price_at_purchase: Amount) -> Self {
        Self { product_id, quantity, price_at_purchase }
    }

    pub fn subtotal(&self) -> Amount {
        self.price_at_purchase * self.quantity
    }
}

//--------------------------------------        LineItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_at_purchase: Amount,
}

impl LineItem {
    pub fn subtotal(&self) -> Amount {
        self.price_at_purchase * self.quantity
    }
}

//--------------------------------------   OrderStatusChange   ---------------------------------------------------------
/// Audit record of a status transition that was actually applied.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusChange {
    pub id: i64,
    pub order_id: OrderId,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub payment_reference: PaymentReference,
    pub changed_at: DateTime<Utc>,
}

//-------------------------------------- ReconciliationReason  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationReason {
    /// A verified notification arrived for a charge id that matches no order (yet).
    UnmatchedNotification,
    /// An order already in a terminal status was told to move to the other terminal status.
    ConflictingNotification,
    /// A charge was created, but the order could not be written to the ledger.
    OrphanedCharge,
}

impl Display for ReconciliationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconciliationReason::UnmatchedNotification => write!(f, "unmatched_notification"),
            ReconciliationReason::ConflictingNotification => write!(f, "conflicting_notification"),
            ReconciliationReason::OrphanedCharge => write!(f, "orphaned_charge"),
        }
    }
}

//--------------------------------------  ReconciliationEntry  ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewReconciliationEntry {
    pub reason: ReconciliationReason,
    pub payment_reference: PaymentReference,
    pub requested_status: Option<OrderStatusType>,
    pub user_id: Option<UserId>,
    pub amount: Option<Amount>,
    pub detail: String,
}

impl NewReconciliationEntry {
    pub fn unmatched(payment_reference: PaymentReference, requested_status: OrderStatusType) -> Self {
        Self {
            reason: ReconciliationReason::UnmatchedNotification,
            payment_reference,
            requested_status: Some(requested_status),
            user_id: None,
            amount: None,
            detail: format!("No order matched the {requested_status} notification"),
        }
    }

    /// A verified notification the ledger failed to apply. It is replayed like an unmatched notification.
    pub fn unapplied(payment_reference: PaymentReference, requested_status: OrderStatusType, error: &str) -> Self {
        Self {
            reason: ReconciliationReason::UnmatchedNotification,
            payment_reference,
            requested_status: Some(requested_status),
            user_id: None,
            amount: None,
            detail: format!("The {requested_status} notification could not be applied. {error}"),
        }
    }

    /// `order` is the order as it currently stands, if it could be read.
    pub fn conflicting(
        payment_reference: PaymentReference,
        current_status: OrderStatusType,
        requested_status: OrderStatusType,
        order: Option<&Order>,
    ) -> Self {
        Self {
            reason: ReconciliationReason::ConflictingNotification,
            payment_reference,
            requested_status: Some(requested_status),
            user_id: order.map(|o| o.user_id),
            amount: order.map(|o| o.total_amount),
            detail: format!("Order is already {current_status}. The {requested_status} notification was not applied"),
        }
    }

    pub fn orphaned_charge(payment_reference: PaymentReference, user_id: UserId, amount: Amount, detail: String) -> Self {
        Self {
            reason: ReconciliationReason::OrphanedCharge,
            payment_reference,
            requested_status: None,
            user_id: Some(user_id),
            amount: Some(amount),
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ReconciliationEntry {
    pub id: i64,
    pub reason: ReconciliationReason,
    pub payment_reference: PaymentReference,
    pub requested_status: Option<OrderStatusType>,
    pub user_id: Option<UserId>,
    pub amount: Option<Amount>,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ReconciliationEntry {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}
