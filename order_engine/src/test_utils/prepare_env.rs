use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{NewProduct, Product},
    SqliteDatabase,
};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    let path = std::env::temp_dir().join(format!("sfg_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Could not drop database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

/// A fresh, migrated database at a random location.
pub async fn new_test_database() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

/// Adds the given `(name, price)` pairs to the catalog. Prices are decimal strings, e.g. `"10.00"`.
pub async fn seed_products(db: &SqliteDatabase, products: &[(&str, &str)]) -> Vec<Product> {
    let mut result = Vec::with_capacity(products.len());
    for (name, price) in products {
        let price = price.parse().expect("Invalid price");
        let product = NewProduct::new(*name, price).with_description(format!("A fine {name}")).with_inventory(100);
        result.push(db.insert_product(product).await.expect("Error inserting product"));
    }
    result
}
