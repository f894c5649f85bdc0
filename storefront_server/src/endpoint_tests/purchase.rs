use actix_web::{http::StatusCode, test::TestRequest};
use order_engine::{
    db_types::{OrderId, OrderStatusType, ProductId, UserId},
    order_objects::{OrderHistoryEntry, PurchaseResult},
    traits::{CatalogError, GatewayError},
};
use serde_json::json;

use super::helpers::{amount, order_with_status, product, recorded_order, send_request, MockApis};
use crate::{data_objects::OrderDetail, identity::USER_HEADER};

fn purchase_request(user: Option<&str>, body: serde_json::Value) -> TestRequest {
    let mut req = TestRequest::post().uri("/api/purchase").set_json(body);
    if let Some(user) = user {
        req = req.insert_header((USER_HEADER, user));
    }
    req
}

fn two_items() -> serde_json::Value {
    json!({
        "items": [{"product_id": 1, "quantity": 2}, {"product_id": 2, "quantity": 1}],
        "requested_at": "2024-06-01T12:00:00Z"
    })
}

#[actix_web::test]
async fn purchase_without_user_header() {
    let mut apis = MockApis::new();
    apis.purchase_gateway.expect_create_charge().never();
    let (status, body) = send_request(purchase_request(None, two_items()), apis).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("X-Authenticated-User"), "{body}");
}

#[actix_web::test]
async fn purchase_with_invalid_user_header() {
    let mut apis = MockApis::new();
    apis.purchase_gateway.expect_create_charge().never();
    let (status, _) = send_request(purchase_request(Some("not-a-number"), two_items()), apis).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn successful_purchase() {
    let mut apis = MockApis::new();
    apis.purchase_db.expect_fetch_product().times(2).returning(|id| Ok(product(id, "10.00")));
    apis.purchase_gateway
        .expect_create_charge()
        .withf(|total, key| *total == amount("30.00") && key.as_str().ends_with("__userID__7"))
        .times(1)
        .returning(|_, _| Ok("pi_123".into()));
    apis.purchase_db.expect_create_order().times(1).returning(|order, items| Ok(recorded_order(order, items)));
    let (status, body) = send_request(purchase_request(Some("7"), two_items()), apis).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let result: PurchaseResult = serde_json::from_str(&body).expect("Invalid purchase response");
    assert_eq!(result.order.user_id, UserId(7));
    assert_eq!(result.order.status, OrderStatusType::Pending);
    assert_eq!(result.order.total_amount, amount("30.00"));
    assert_eq!(result.order.payment_reference.as_str(), "pi_123");
    assert_eq!(result.line_items.len(), 2);
    assert_eq!(result.line_items[0].product_id, ProductId(1));
    assert_eq!(result.line_items[0].quantity, 2);
}

#[actix_web::test]
async fn empty_purchase_is_rejected() {
    let mut apis = MockApis::new();
    apis.purchase_db.expect_fetch_product().never();
    apis.purchase_gateway.expect_create_charge().never();
    apis.purchase_db.expect_create_order().never();
    let (status, body) = send_request(purchase_request(Some("7"), json!({"items": []})), apis).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at least one item"), "{body}");
}

#[actix_web::test]
async fn unparseable_body_is_rejected() {
    let req = TestRequest::post()
        .uri("/api/purchase")
        .insert_header((USER_HEADER, "7"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"items\": [");
    let (status, body) = send_request(req, MockApis::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("{\"error\""), "{body}");
}

#[actix_web::test]
async fn unknown_product() {
    let mut apis = MockApis::new();
    apis.purchase_db.expect_fetch_product().returning(|id| Err(CatalogError::ProductNotFound(id)));
    apis.purchase_gateway.expect_create_charge().never();
    apis.purchase_db.expect_create_order().never();
    let (status, body) = send_request(purchase_request(Some("7"), two_items()), apis).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Product 1 does not exist"), "{body}");
}

#[actix_web::test]
async fn declined_charge() {
    let mut apis = MockApis::new();
    apis.purchase_db.expect_fetch_product().returning(|id| Ok(product(id, "10.00")));
    apis.purchase_gateway
        .expect_create_charge()
        .returning(|_, _| Err(GatewayError::Rejected("Your card was declined".into())));
    apis.purchase_db.expect_create_order().never();
    let (status, body) = send_request(purchase_request(Some("7"), two_items()), apis).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body.contains("Your card was declined"), "{body}");
}

#[actix_web::test]
async fn gateway_unavailable() {
    let mut apis = MockApis::new();
    apis.purchase_db.expect_fetch_product().returning(|id| Ok(product(id, "10.00")));
    apis.purchase_gateway
        .expect_create_charge()
        .returning(|_, _| Err(GatewayError::Unavailable("connection reset".into())));
    apis.purchase_db.expect_create_order().never();
    let (status, _) = send_request(purchase_request(Some("7"), two_items()), apis).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn purchase_history_for_user() {
    let mut apis = MockApis::new();
    apis.history_db.expect_purchase_history().withf(|user| *user == UserId(7)).returning(|_| {
        Ok(vec![OrderHistoryEntry { order: order_with_status("pi_123", OrderStatusType::Paid), items: vec![] }])
    });
    let req = TestRequest::get().uri("/api/purchase-history").insert_header((USER_HEADER, "7"));
    let (status, body) = send_request(req, apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let history: Vec<OrderHistoryEntry> = serde_json::from_str(&body).expect("Invalid history response");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].order.status, OrderStatusType::Paid);
}

#[actix_web::test]
async fn purchase_history_requires_a_user() {
    let mut apis = MockApis::new();
    apis.history_db.expect_purchase_history().never();
    let (status, _) = send_request(TestRequest::get().uri("/api/purchase-history"), apis).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_check() {
    let (status, body) = send_request(TestRequest::get().uri("/health"), MockApis::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn order_detail_for_owner() {
    let mut apis = MockApis::new();
    apis.history_db
        .expect_fetch_order()
        .withf(|id| *id == OrderId(1))
        .returning(|_| Ok(Some(order_with_status("pi_123", OrderStatusType::Pending))));
    apis.history_db.expect_fetch_line_items().returning(|_| Ok(vec![]));
    apis.history_db.expect_status_history().returning(|_| Ok(vec![]));
    let req = TestRequest::get().uri("/api/orders/1").insert_header((USER_HEADER, "1"));
    let (status, body) = send_request(req, apis).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let detail: OrderDetail = serde_json::from_str(&body).unwrap();
    assert_eq!(detail.order.payment_reference.as_str(), "pi_123");
    assert!(detail.status_history.is_empty());
}

#[actix_web::test]
async fn other_users_orders_are_not_found() {
    let mut apis = MockApis::new();
    apis.history_db
        .expect_fetch_order()
        .returning(|_| Ok(Some(order_with_status("pi_123", OrderStatusType::Pending))));
    apis.history_db.expect_fetch_line_items().returning(|_| Ok(vec![]));
    apis.history_db.expect_status_history().never();
    let req = TestRequest::get().uri("/api/orders/1").insert_header((USER_HEADER, "2"));
    let (status, _) = send_request(req, apis).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
