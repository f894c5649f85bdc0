use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use cucumber::World;
use log::*;
use order_engine::{
    db_types::ProductId,
    events::EventProducers,
    order_objects::PurchaseResult,
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        FakeGateway,
    },
    Deadlines,
    HistoryApi,
    NotificationOutcome,
    PurchaseApi,
    PurchaseError,
    ReconciliationApi,
    ReconciliationError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<StorefrontSystem>,
    pub products: HashMap<String, ProductId>,
    pub last_purchase: Option<Result<PurchaseResult, PurchaseError>>,
    pub last_notification: Option<Result<NotificationOutcome, ReconciliationError>>,
    /// Successive purchases get request times one second apart, so that each one gets its own idempotency key
    pub purchase_count: i64,
}

#[derive(Debug)]
pub struct StorefrontSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub purchases: PurchaseApi<SqliteDatabase, FakeGateway>,
    pub reconciliation: ReconciliationApi<SqliteDatabase, FakeGateway>,
    pub history: HistoryApi<SqliteDatabase>,
    pub started_at: DateTime<Utc>,
}

impl StorefrontWorld {
    pub fn system(&self) -> &StorefrontSystem {
        self.system.as_ref().expect("Storefront system not initialised")
    }

    pub fn product(&self, name: &str) -> ProductId {
        *self.products.get(name).unwrap_or_else(|| panic!("Product {name} is not in the catalog"))
    }

    pub fn next_request_time(&mut self) -> DateTime<Utc> {
        self.purchase_count += 1;
        self.system().started_at + Duration::seconds(self.purchase_count)
    }

    pub fn last_order(&self) -> &PurchaseResult {
        match &self.last_purchase {
            Some(Ok(result)) => result,
            Some(Err(e)) => panic!("The last purchase failed: {e}"),
            None => panic!("No purchase has been made"),
        }
    }
}

impl StorefrontSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let gateway = FakeGateway::new();
        let deadlines = Deadlines::default();
        let producers = EventProducers::default();
        let purchases = PurchaseApi::new(db.clone(), gateway.clone(), producers.clone(), deadlines);
        let reconciliation = ReconciliationApi::new(db.clone(), gateway.clone(), producers, deadlines);
        let history = HistoryApi::new(db.clone(), deadlines);
        Self { db_path: url, db, gateway, purchases, reconciliation, history, started_at: Utc::now() }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
