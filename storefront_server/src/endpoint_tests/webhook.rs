use actix_web::{http::StatusCode, test::TestRequest};
use order_engine::{
    db_types::{OrderStatusType, PaymentReference, ReconciliationReason},
    traits::{GatewayNotification, LedgerError, NotificationError, NotificationKind, StatusUpdate},
};
use stripe_tools::webhook::SIGNATURE_HEADER;

use super::helpers::{order_with_status, queued_entry, send_request, MockApis};

const PAYLOAD: &str = r#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_123"}}}"#;

fn webhook_request(signature: Option<&str>) -> TestRequest {
    let mut req = TestRequest::post().uri("/webhook/stripe").set_payload(PAYLOAD);
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    req
}

fn succeeded(apis: &mut MockApis) {
    apis.reconciliation_gateway
        .expect_verify_and_decode_notification()
        .withf(|payload, sig| payload == PAYLOAD.as_bytes() && sig == "t=1,v1=good")
        .returning(|_, _| Ok(GatewayNotification::new(NotificationKind::Succeeded, "pi_123".into())));
}

#[actix_web::test]
async fn missing_signature_header() {
    let mut apis = MockApis::new();
    apis.reconciliation_gateway.expect_verify_and_decode_notification().never();
    apis.reconciliation_db.expect_update_status_by_payment_reference().never();
    let (status, body) = send_request(webhook_request(None), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Stripe-Signature"), "{body}");
}

#[actix_web::test]
async fn forged_signature_is_never_applied() {
    let mut apis = MockApis::new();
    apis.reconciliation_gateway
        .expect_verify_and_decode_notification()
        .returning(|_, _| Err(NotificationError::SignatureInvalid("No matching signature".into())));
    apis.reconciliation_db.expect_update_status_by_payment_reference().never();
    let (status, body) = send_request(webhook_request(Some("t=1,v1=forged")), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid webhook signature"), "{body}");
}

#[actix_web::test]
async fn malformed_payload() {
    let mut apis = MockApis::new();
    apis.reconciliation_gateway
        .expect_verify_and_decode_notification()
        .returning(|_, _| Err(NotificationError::Malformed("no object id".into())));
    apis.reconciliation_db.expect_update_status_by_payment_reference().never();
    let (status, _) = send_request(webhook_request(Some("t=1,v1=good")), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn succeeded_notification_marks_the_order_paid() {
    let mut apis = MockApis::new();
    succeeded(&mut apis);
    apis.reconciliation_db
        .expect_update_status_by_payment_reference()
        .withf(|reference, status| reference.as_str() == "pi_123" && *status == OrderStatusType::Paid)
        .times(1)
        .returning(|reference, status| {
            let order = order_with_status(reference.as_str(), status);
            Ok(StatusUpdate::Updated { old: OrderStatusType::Pending, order })
        });
    let (status, body) = send_request(webhook_request(Some("t=1,v1=good")), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["received"], true);
    assert_eq!(ack["outcome"]["Applied"]["status"], "paid");
}

#[actix_web::test]
async fn notification_for_unknown_charge_is_queued() {
    let mut apis = MockApis::new();
    succeeded(&mut apis);
    apis.reconciliation_db
        .expect_update_status_by_payment_reference()
        .returning(|reference, _| Err(LedgerError::NotFound(reference.clone())));
    apis.reconciliation_db
        .expect_push_entry()
        .withf(|entry| entry.payment_reference == PaymentReference::from("pi_123"))
        .times(1)
        .returning(|entry| Ok(queued_entry(1, entry)));
    let (status, body) = send_request(webhook_request(Some("t=1,v1=good")), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["outcome"]["Unmatched"], "pi_123");
}

#[actix_web::test]
async fn ledger_outage_is_acknowledged_and_queued() {
    let mut apis = MockApis::new();
    succeeded(&mut apis);
    apis.reconciliation_db
        .expect_update_status_by_payment_reference()
        .returning(|_, _| Err(LedgerError::DatabaseError("database is locked".into())));
    apis.reconciliation_db
        .expect_push_entry()
        .withf(|entry| {
            entry.payment_reference == PaymentReference::from("pi_123")
                && entry.reason == ReconciliationReason::UnmatchedNotification
                && entry.requested_status == Some(OrderStatusType::Paid)
                && entry.detail.contains("database is locked")
        })
        .times(1)
        .returning(|entry| Ok(queued_entry(1, entry)));
    let (status, body) = send_request(webhook_request(Some("t=1,v1=good")), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["received"], true);
    assert_eq!(ack["outcome"]["Deferred"], "pi_123");
}
