use std::fmt::Debug;

use log::*;
use storefront_common::Amount;

use crate::{
    db_types::{NewLineItem, NewOrder, NewReconciliationEntry, PaymentReference, UserId},
    events::{EventProducers, ReconciliationRequiredEvent},
    order_api::{bounded, errors::PurchaseError, Deadlines},
    order_objects::{PurchaseItem, PurchaseRequest, PurchaseResult},
    traits::{
        CatalogError,
        CatalogReader,
        GatewayError,
        IdempotencyKey,
        LedgerError,
        OrderLedger,
        PaymentGateway,
        ReconciliationQueue,
        ReconciliationQueueError,
    },
};

/// `PurchaseApi` prices a purchase request from the catalog, charges the user for it, and records the order.
///
/// The steps always run in this order, and each one only starts when the previous one succeeded:
/// 1. Validate the request. No external calls are made for an invalid request.
/// 2. Resolve the current price of every item. A missing product fails the whole purchase, before any charge.
/// 3. Create a charge for the total, with an idempotency key derived from the user and the request time.
/// 4. Write the order and its line items to the ledger as `pending`, in one transaction.
///
/// If step 4 fails, a charge exists without an order. That is never retried here. It is logged, queued for an
/// operator as an orphaned charge, and reported as [`PurchaseError::LedgerWriteFailure`].
pub struct PurchaseApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    deadlines: Deadlines,
}

impl<B, G> Debug for PurchaseApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PurchaseApi ({:?})", self.deadlines)
    }
}

impl<B, G> PurchaseApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, deadlines: Deadlines) -> Self {
        Self { db, gateway, producers, deadlines }
    }
}

impl<B, G> PurchaseApi<B, G>
where
    B: OrderLedger + CatalogReader + ReconciliationQueue,
    G: PaymentGateway,
{
    pub async fn purchase(&self, user_id: UserId, request: PurchaseRequest) -> Result<PurchaseResult, PurchaseError> {
        validate_request(&request)?;
        let line_items = self.price_items(&request.items).await?;
        let total = line_items.iter().map(NewLineItem::subtotal).sum::<Amount>();
        let key = IdempotencyKey::for_purchase(user_id, request.requested_at);
        debug!("🛒️ User {user_id} purchase of {} items priced at {total}. Creating charge [{key}]", line_items.len());

        let charge_id = bounded(self.deadlines.gateway, self.gateway.create_charge(total, &key), |ms| {
            GatewayError::Unavailable(format!("No response within {ms}ms"))
        })
        .await
        .map_err(|e| {
            warn!("🛒️ Could not create charge for user {user_id}. {e}");
            PurchaseError::from(e)
        })?;
        debug!("🛒️ Charge {charge_id} created for user {user_id}");

        let order = NewOrder::new(user_id, total, charge_id.clone());
        let write = bounded(self.deadlines.ledger, self.db.create_order(order, line_items), LedgerError::Timeout).await;
        match write {
            Ok((order, line_items)) => {
                info!("🛒️ Order {} for user {user_id} recorded as pending. Charge {charge_id} for {total}", order.id);
                Ok(PurchaseResult { order, line_items })
            },
            Err(LedgerError::DuplicatePaymentReference(reference)) => self.existing_purchase(user_id, reference).await,
            Err(e) => {
                let reason = e.to_string();
                self.record_orphaned_charge(user_id, total, &charge_id, &reason).await;
                Err(PurchaseError::LedgerWriteFailure { payment_reference: charge_id, reason })
            },
        }
    }

    async fn price_items(&self, items: &[PurchaseItem]) -> Result<Vec<NewLineItem>, PurchaseError> {
        let mut line_items = Vec::with_capacity(items.len());
        for item in items {
            let product =
                bounded(self.deadlines.ledger, self.db.fetch_product(item.product_id), CatalogError::Timeout).await?;
            trace!("🛒️ Product {} priced at {}", product.id, product.price);
            line_items.push(NewLineItem::new(product.id, item.quantity, product.price));
        }
        Ok(line_items)
    }

    /// A retried purchase (same user, same request time) gets the same charge back from the gateway. The order for
    /// that charge is already in the ledger, so it is returned as the result of the retry.
    async fn existing_purchase(
        &self,
        user_id: UserId,
        reference: PaymentReference,
    ) -> Result<PurchaseResult, PurchaseError> {
        let lookup = self.fetch_purchase(&reference);
        match bounded(self.deadlines.ledger, lookup, LedgerError::Timeout).await {
            Ok(Some(result)) if result.order.user_id == user_id => {
                info!("🛒️ Purchase retry for charge {reference}. Returning existing order {}", result.order.id);
                Ok(result)
            },
            Ok(_) => {
                let reason = format!("Charge {reference} is already recorded against a different order");
                error!("🛒️ {reason}");
                Err(PurchaseError::LedgerWriteFailure { payment_reference: reference, reason })
            },
            Err(e) => Err(PurchaseError::LedgerWriteFailure { payment_reference: reference, reason: e.to_string() }),
        }
    }

    async fn fetch_purchase(&self, reference: &PaymentReference) -> Result<Option<PurchaseResult>, LedgerError> {
        let order = match self.db.fetch_order_by_payment_reference(reference).await? {
            Some(order) => order,
            None => return Ok(None),
        };
        let line_items = self.db.fetch_line_items(order.id).await?;
        Ok(Some(PurchaseResult { order, line_items }))
    }

    async fn record_orphaned_charge(&self, user_id: UserId, total: Amount, charge_id: &PaymentReference, reason: &str) {
        error!(
            "🛒️ RECONCILIATION REQUIRED. Charge {charge_id} for {total} (user {user_id}) was created, but the order \
             could not be saved. {reason}"
        );
        let detail = format!("Ledger write failed: {reason}");
        let request = NewReconciliationEntry::orphaned_charge(charge_id.clone(), user_id, total, detail);
        let push = self.db.push_entry(request.clone());
        let entry = match bounded(self.deadlines.ledger, push, ReconciliationQueueError::Timeout).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!("🛒️ Could not queue orphaned charge {charge_id} for reconciliation either. {e}");
                None
            },
        };
        self.producers.publish_reconciliation_required(ReconciliationRequiredEvent::new(&request, entry)).await;
    }
}

/// Checks the request shape. Prices never come from the request, so there is nothing else to validate.
pub fn validate_request(request: &PurchaseRequest) -> Result<(), PurchaseError> {
    if request.items.is_empty() {
        return Err(PurchaseError::ValidationError("A purchase must contain at least one item".into()));
    }
    if let Some(item) = request.items.iter().find(|i| i.quantity < 1) {
        return Err(PurchaseError::ValidationError(format!(
            "Quantity for product {} must be at least 1, but was {}",
            item.product_id, item.quantity
        )));
    }
    Ok(())
}
