use cucumber::{then, when};
use order_engine::{
    db_types::{OrderStatusType, ProductId, ReconciliationReason, UserId},
    order_objects::PurchaseRequest,
    test_utils::{FakeGateway, FAKE_WEBHOOK_SECRET},
    traits::{NotificationKind, OrderLedger},
    PurchaseError,
    ReconciliationError,
};
use storefront_common::Amount;

use crate::cucumber::StorefrontWorld;

async fn purchase(world: &mut StorefrontWorld, user_id: i64, items: Vec<(ProductId, i64)>) {
    let mut request = PurchaseRequest::new(vec![], world.next_request_time());
    for (product_id, quantity) in items {
        request = request.with_item(product_id, quantity);
    }
    let result = world.system().purchases.purchase(UserId(user_id), request).await;
    world.last_purchase = Some(result);
}

fn notification_kind(outcome: &str) -> NotificationKind {
    match outcome {
        "succeeded" => NotificationKind::Succeeded,
        "failed" => NotificationKind::Failed,
        other => NotificationKind::Other(other.to_string()),
    }
}

async fn notify(world: &mut StorefrontWorld, charge_id: &str, outcome: &str, signature: &str) {
    let payload = FakeGateway::notification_payload(notification_kind(outcome), &charge_id.into());
    let result = world.system().reconciliation.handle_notification(&payload, signature).await;
    world.last_notification = Some(result);
}

#[when(expr = "user {int} buys {int} '{word}'")]
async fn buy_one(world: &mut StorefrontWorld, user_id: i64, qty: i64, name: String) {
    let items = vec![(world.product(&name), qty)];
    purchase(world, user_id, items).await;
}

#[when(expr = "user {int} buys {int} '{word}' and {int} '{word}'")]
async fn buy_two(world: &mut StorefrontWorld, user_id: i64, qty1: i64, name1: String, qty2: i64, name2: String) {
    let items = vec![(world.product(&name1), qty1), (world.product(&name2), qty2)];
    purchase(world, user_id, items).await;
}

#[when(expr = "user {int} buys {int} of product {int}")]
async fn buy_by_id(world: &mut StorefrontWorld, user_id: i64, qty: i64, product_id: i64) {
    purchase(world, user_id, vec![(ProductId(product_id), qty)]).await;
}

#[when(expr = "user {int} submits an empty purchase")]
async fn empty_purchase(world: &mut StorefrontWorld, user_id: i64) {
    purchase(world, user_id, vec![]).await;
}

#[when(expr = "the gateway reports that the charge {word}")]
async fn charge_outcome(world: &mut StorefrontWorld, outcome: String) {
    let charge_id = world.last_order().order.payment_reference.as_str().to_string();
    notify(world, &charge_id, &outcome, FAKE_WEBHOOK_SECRET).await;
}

#[when(expr = "the gateway reports that charge '{word}' {word}")]
async fn named_charge_outcome(world: &mut StorefrontWorld, charge_id: String, outcome: String) {
    notify(world, &charge_id, &outcome, FAKE_WEBHOOK_SECRET).await;
}

#[when(expr = "a notification with a bad signature says the charge {word}")]
async fn forged_notification(world: &mut StorefrontWorld, outcome: String) {
    let charge_id = world.last_order().order.payment_reference.as_str().to_string();
    notify(world, &charge_id, &outcome, "t=1,v1=forged").await;
}

#[when("the operator replays unmatched notifications")]
async fn replay(world: &mut StorefrontWorld) {
    world.system().reconciliation.replay_unmatched().await.expect("Replay failed");
}

#[then("the purchase succeeds")]
async fn purchase_succeeds(world: &mut StorefrontWorld) {
    let _ = world.last_order();
}

#[then("the purchase fails with a validation error")]
async fn validation_error(world: &mut StorefrontWorld) {
    assert!(
        matches!(world.last_purchase, Some(Err(PurchaseError::ValidationError(_)))),
        "Unexpected result: {:?}",
        world.last_purchase
    );
}

#[then(expr = "the purchase fails because product {int} does not exist")]
async fn missing_product(world: &mut StorefrontWorld, product_id: i64) {
    match &world.last_purchase {
        Some(Err(PurchaseError::ProductNotFound(id))) => assert_eq!(*id, ProductId(product_id)),
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[then("no charge was made")]
async fn no_charge(world: &mut StorefrontWorld) {
    assert_eq!(world.system().gateway.charge_count(), 0);
}

#[then(expr = "the order total is {word}")]
async fn order_total(world: &mut StorefrontWorld, total: String) {
    let expected = total.parse::<Amount>().expect("Not a valid amount");
    let order = &world.last_order().order;
    assert_eq!(order.total_amount, expected);
    let items_total: Amount = world.last_order().line_items.iter().map(|i| i.subtotal()).sum();
    assert_eq!(items_total, expected);
}

#[then(expr = "the gateway was charged {int} minor units")]
async fn charged(world: &mut StorefrontWorld, minor_units: i64) {
    let charge_id = &world.last_order().order.payment_reference;
    let charged = world.system().gateway.charged_amount(charge_id).expect("No charge was made");
    assert_eq!(charged.value(), minor_units);
}

#[then(expr = "the order has {int} line items")]
async fn line_item_count(world: &mut StorefrontWorld, count: usize) {
    assert_eq!(world.last_order().line_items.len(), count);
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut StorefrontWorld, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid status");
    let id = world.last_order().order.id;
    let order = world.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.status, expected);
}

#[then(expr = "the order has {int} status changes")]
async fn status_change_count(world: &mut StorefrontWorld, count: usize) {
    let id = world.last_order().order.id;
    let changes = world.system().history.status_history(id).await.expect("Error fetching status history");
    assert_eq!(changes.len(), count);
}

#[then("the notification is rejected")]
async fn notification_rejected(world: &mut StorefrontWorld) {
    assert!(
        matches!(world.last_notification, Some(Err(ReconciliationError::SignatureInvalid(_)))),
        "Unexpected result: {:?}",
        world.last_notification
    );
}

#[then(expr = "there are {int} outstanding reconciliation entries")]
async fn outstanding_count(world: &mut StorefrontWorld, count: i64) {
    let outstanding = world.system().reconciliation.count_outstanding().await.expect("Error counting entries");
    assert_eq!(outstanding, count);
}

#[then(expr = "there is an outstanding {word} entry")]
async fn outstanding_reason(world: &mut StorefrontWorld, reason: String) {
    let reason = match reason.as_str() {
        "unmatched_notification" => ReconciliationReason::UnmatchedNotification,
        "conflicting_notification" => ReconciliationReason::ConflictingNotification,
        "orphaned_charge" => ReconciliationReason::OrphanedCharge,
        r => panic!("Unknown reconciliation reason: {r}"),
    };
    let entries = world.system().reconciliation.outstanding_entries().await.expect("Error fetching entries");
    assert!(entries.iter().any(|e| e.reason == reason), "No {reason} entry in {entries:?}");
}

#[then(expr = "user {int} has {int} orders in their purchase history")]
async fn history_length(world: &mut StorefrontWorld, user_id: i64, count: usize) {
    let history = world.system().history.purchase_history(UserId(user_id)).await.expect("Error fetching history");
    assert_eq!(history.len(), count);
}

#[then(expr = "the most recent order for user {int} has {int} line items")]
async fn most_recent_items(world: &mut StorefrontWorld, user_id: i64, count: usize) {
    let history = world.system().history.purchase_history(UserId(user_id)).await.expect("Error fetching history");
    let latest = history.first().expect("User has no orders");
    assert_eq!(latest.items.len(), count);
}

#[then(expr = "every order in the purchase history of user {int} adds up to its total")]
async fn history_totals(world: &mut StorefrontWorld, user_id: i64) {
    let history = world.system().history.purchase_history(UserId(user_id)).await.expect("Error fetching history");
    for entry in history {
        assert!(entry.items.iter().all(|i| i.order_id == entry.order.id));
        assert_eq!(entry.items_total(), entry.order.total_amount, "Order {} items do not add up", entry.order.id);
    }
}
