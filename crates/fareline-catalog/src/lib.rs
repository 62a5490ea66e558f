//! Product catalog: the per-region provider/tariff records, the Postgres
//! store that loads them, and the in-memory cache that serves reads.

mod cache;
mod product;
mod store;

pub use cache::{ProductCache, ProductStore};
pub use product::{Operator, Phone, Product, Site, StoreUrl, StoreUrls};
pub use store::{fold_rows, PgProductStore, ProviderRow};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("products not found in cache for region {0}")]
    NoProducts(i32),

    #[error("provider record is missing a required field: {context}")]
    InvalidRecord { context: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
