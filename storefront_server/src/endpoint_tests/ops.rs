use actix_web::{http::StatusCode, test::TestRequest};
use order_engine::{
    db_types::{
        NewReconciliationEntry,
        OrderStatusType,
        ProductId,
        ReconciliationEntry,
        ReconciliationReason,
        UserId,
    },
    order_objects::{ProductSales, ReplaySummary},
    traits::ReconciliationQueueError,
};

use super::helpers::{amount, queued_entry, send_request, MockApis};

#[actix_web::test]
async fn list_outstanding_entries() {
    let mut apis = MockApis::new();
    apis.reconciliation_db.expect_outstanding_entries().withf(|reason| reason.is_none()).returning(|_| {
        Ok(vec![
            queued_entry(1, NewReconciliationEntry::unmatched("pi_early".into(), OrderStatusType::Paid)),
            queued_entry(
                2,
                NewReconciliationEntry::orphaned_charge("pi_lost".into(), UserId(4), amount("9.99"), "disk full".into()),
            ),
        ])
    });
    let (status, body) = send_request(TestRequest::get().uri("/ops/reconciliation"), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let entries: Vec<ReconciliationEntry> = serde_json::from_str(&body).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].reason, ReconciliationReason::UnmatchedNotification);
    assert_eq!(entries[1].reason, ReconciliationReason::OrphanedCharge);
    assert_eq!(entries[1].amount, Some(amount("9.99")));
}

#[actix_web::test]
async fn resolve_entry() {
    let mut apis = MockApis::new();
    apis.reconciliation_db.expect_resolve_entry().withf(|id| *id == 3).times(1).returning(|id| {
        let mut entry = queued_entry(id, NewReconciliationEntry::unmatched("pi_1".into(), OrderStatusType::Failed));
        entry.resolved_at = Some(chrono::Utc::now());
        Ok(entry)
    });
    let (status, body) = send_request(TestRequest::post().uri("/ops/reconciliation/3/resolve"), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let entry: ReconciliationEntry = serde_json::from_str(&body).unwrap();
    assert!(entry.is_resolved());
}

#[actix_web::test]
async fn resolve_missing_entry() {
    let mut apis = MockApis::new();
    apis.reconciliation_db.expect_resolve_entry().returning(|id| Err(ReconciliationQueueError::EntryNotFound(id)));
    let (status, body) = send_request(TestRequest::post().uri("/ops/reconciliation/99/resolve"), apis).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("99"), "{body}");
}

#[actix_web::test]
async fn replay_with_nothing_outstanding() {
    let mut apis = MockApis::new();
    apis.reconciliation_db
        .expect_outstanding_entries()
        .withf(|reason| *reason == Some(ReconciliationReason::UnmatchedNotification))
        .times(1)
        .returning(|_| Ok(vec![]));
    apis.reconciliation_db.expect_update_status_by_payment_reference().never();
    let (status, body) = send_request(TestRequest::post().uri("/ops/reconciliation/replay"), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary: ReplaySummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary, ReplaySummary::default());
}

#[actix_web::test]
async fn sales_report_for_one_user() {
    let mut apis = MockApis::new();
    apis.history_db
        .expect_sales_report()
        .withf(|q| q.user_id == Some(UserId(3)) && q.status.is_none() && q.from < q.to)
        .times(1)
        .returning(|_| {
            Ok(vec![ProductSales {
                product_id: ProductId(1),
                name: "Widget".into(),
                total_quantity: 4,
                total_revenue: amount("40.00"),
            }])
        });
    let uri = "/ops/sales?from=2024-06-01T00:00:00Z&to=2024-06-30T00:00:00Z&user_id=3";
    let (status, body) = send_request(TestRequest::get().uri(uri), apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report: Vec<ProductSales> = serde_json::from_str(&body).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].total_revenue, amount("40.00"));
}

#[actix_web::test]
async fn sales_report_window_must_be_ordered() {
    let mut apis = MockApis::new();
    apis.history_db.expect_sales_report().never();
    let uri = "/ops/sales?from=2024-06-30T00:00:00Z&to=2024-06-01T00:00:00Z";
    let (status, body) = send_request(TestRequest::get().uri(uri), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is after"), "{body}");
}

#[actix_web::test]
async fn sales_report_needs_a_window() {
    let mut apis = MockApis::new();
    apis.history_db.expect_sales_report().never();
    let (status, _) = send_request(TestRequest::get().uri("/ops/sales?user_id=3"), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
