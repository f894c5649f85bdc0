use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web::{self, ServiceConfig},
    App,
};
use chrono::Utc;
use log::debug;
use order_engine::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
        NewReconciliationEntry,
        Order,
        OrderId,
        OrderStatusType,
        Product,
        ProductId,
        ReconciliationEntry,
    },
    events::EventProducers,
    Deadlines,
    HistoryApi,
    PurchaseApi,
    ReconciliationApi,
};
use storefront_common::Amount;

use super::mocks::{MockBackend, MockGateway};
use crate::server::storefront_routes;

/// One mock backend per engine API, so each test only sets up the calls it expects.
pub struct MockApis {
    pub purchase_db: MockBackend,
    pub purchase_gateway: MockGateway,
    pub reconciliation_db: MockBackend,
    pub reconciliation_gateway: MockGateway,
    pub history_db: MockBackend,
}

impl MockApis {
    pub fn new() -> Self {
        Self {
            purchase_db: MockBackend::new(),
            purchase_gateway: MockGateway::new(),
            reconciliation_db: MockBackend::new(),
            reconciliation_gateway: MockGateway::new(),
            history_db: MockBackend::new(),
        }
    }

    fn configure(self, cfg: &mut ServiceConfig) {
        let deadlines = Deadlines::default();
        let producers = EventProducers::default();
        let purchase_api = PurchaseApi::new(self.purchase_db, self.purchase_gateway, producers.clone(), deadlines);
        let reconciliation_api =
            ReconciliationApi::new(self.reconciliation_db, self.reconciliation_gateway, producers, deadlines);
        let history_api = HistoryApi::new(self.history_db, deadlines);
        cfg.app_data(web::Data::new(purchase_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(history_api));
        storefront_routes::<MockBackend, MockGateway>(cfg);
    }
}

pub async fn send_request(req: TestRequest, apis: MockApis) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let app = App::new().configure(move |cfg| apis.configure(cfg));
    let service = test::init_service(app).await;
    let req = req.to_request();
    debug!("Making request to {}", req.path());
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn amount(s: &str) -> Amount {
    s.parse().expect("Invalid amount")
}

pub fn product(id: ProductId, price: &str) -> Product {
    Product {
        id,
        name: format!("Product {id}"),
        description: String::default(),
        price: amount(price),
        inventory_count: 10,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// The order and line items the ledger would write for the given request.
pub fn recorded_order(order: NewOrder, items: Vec<NewLineItem>) -> (Order, Vec<LineItem>) {
    let order = Order {
        id: OrderId(1),
        user_id: order.user_id,
        total_amount: order.total_amount,
        payment_reference: order.payment_reference,
        status: OrderStatusType::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| LineItem {
            id: i as i64 + 1,
            order_id: order.id,
            product_id: item.product_id,
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
        })
        .collect();
    (order, items)
}

pub fn order_with_status(reference: &str, status: OrderStatusType) -> Order {
    Order {
        id: OrderId(1),
        user_id: 1.into(),
        total_amount: amount("25.00"),
        payment_reference: reference.into(),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn queued_entry(id: i64, request: NewReconciliationEntry) -> ReconciliationEntry {
    ReconciliationEntry {
        id,
        reason: request.reason,
        payment_reference: request.payment_reference,
        requested_status: request.requested_status,
        user_id: request.user_id,
        amount: request.amount,
        detail: request.detail,
        created_at: Utc::now(),
        resolved_at: None,
    }
}
