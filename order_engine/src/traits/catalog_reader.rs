use thiserror::Error;

use crate::db_types::{Product, ProductId};

/// Read access to the product catalog. Catalog maintenance happens elsewhere.
#[allow(async_fn_in_trait)]
pub trait CatalogReader: Clone {
    /// Returns the current snapshot of the product, or [`CatalogError::ProductNotFound`].
    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Catalog database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("The catalog did not respond within {0}ms")]
    Timeout(u128),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
