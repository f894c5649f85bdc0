use mockall::mock;
use order_engine::{
    db_types::{
        LineItem,
        NewLineItem,
        NewOrder,
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
        ChargeId,
        GatewayError,
        GatewayNotification,
        IdempotencyKey,
        LedgerError,
        NotificationError,
        OrderLedger,
        PaymentGateway,
        ReconciliationQueue,
        ReconciliationQueueError,
        StatusUpdate,
    },
};
use storefront_common::Amount;

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl OrderLedger for Backend {
        fn url(&self) -> &str;
        async fn create_order(&self, order: NewOrder, line_items: Vec<NewLineItem>) -> Result<(Order, Vec<LineItem>), LedgerError>;
        async fn update_status_by_payment_reference(&self, reference: &PaymentReference, new_status: OrderStatusType) -> Result<StatusUpdate, LedgerError>;
        async fn purchase_history(&self, user_id: UserId) -> Result<Vec<OrderHistoryEntry>, LedgerError>;
        async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, LedgerError>;
        async fn fetch_order_by_payment_reference(&self, reference: &PaymentReference) -> Result<Option<Order>, LedgerError>;
        async fn fetch_line_items(&self, order_id: OrderId) -> Result<Vec<LineItem>, LedgerError>;
        async fn status_history(&self, order_id: OrderId) -> Result<Vec<OrderStatusChange>, LedgerError>;
        async fn sales_report(&self, query: SalesQuery) -> Result<Vec<ProductSales>, LedgerError>;
    }
    impl CatalogReader for Backend {
        async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError>;
    }
    impl ReconciliationQueue for Backend {
        async fn push_entry(&self, entry: NewReconciliationEntry) -> Result<ReconciliationEntry, ReconciliationQueueError>;
        async fn outstanding_entries(&self, reason: Option<ReconciliationReason>) -> Result<Vec<ReconciliationEntry>, ReconciliationQueueError>;
        async fn resolve_entry(&self, id: i64) -> Result<ReconciliationEntry, ReconciliationQueueError>;
    }
}

mock! {
    pub Gateway {}
    impl Clone for Gateway {
        fn clone(&self) -> Self;
    }
    impl PaymentGateway for Gateway {
        async fn create_charge(&self, amount: Amount, key: &IdempotencyKey) -> Result<ChargeId, GatewayError>;
        fn verify_and_decode_notification(&self, payload: &[u8], signature_header: &str) -> Result<GatewayNotification, NotificationError>;
    }
}
