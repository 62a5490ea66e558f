use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{CatalogError, Product};

/// The "load all products grouped by region" contract the cache refreshes
/// from.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn load_all(&self) -> Result<HashMap<i32, Vec<Product>>, CatalogError>;
}

/// In-memory product catalog.
///
/// Readers take a short lock on the map pointer; reload builds the new map
/// off-lock and swaps it in, so a failed refresh leaves the previous snapshot
/// serving and readers never observe a partial update.
pub struct ProductCache {
    store: Arc<dyn ProductStore>,
    map: Mutex<Arc<HashMap<i32, Vec<Product>>>>,
}

impl ProductCache {
    /// Creates the cache with an initial load; a cold start with a broken
    /// store is a startup failure, not a degraded service.
    ///
    /// # Errors
    ///
    /// Propagates the store error from the initial load.
    pub async fn new(store: Arc<dyn ProductStore>) -> Result<Self, CatalogError> {
        let initial = store.load_all().await?;
        Ok(Self {
            store,
            map: Mutex::new(Arc::new(initial)),
        })
    }

    /// Products configured for the region.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoProducts`] when the region is absent.
    pub fn get_products(&self, region_id: i32) -> Result<Vec<Product>, CatalogError> {
        let snapshot = Arc::clone(&self.map.lock().expect("product cache lock poisoned"));
        snapshot
            .get(&region_id)
            .cloned()
            .ok_or(CatalogError::NoProducts(region_id))
    }

    /// True once the cache holds at least one region.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.map.lock().expect("product cache lock poisoned").is_empty()
    }

    /// Fetches the full catalog and atomically replaces the map. On failure
    /// the existing snapshot is retained unchanged.
    ///
    /// # Errors
    ///
    /// Propagates the store error; the caller decides whether that is fatal.
    pub async fn reload(&self) -> Result<(), CatalogError> {
        let rebuilt = self.store.load_all().await?;
        let mut guard = self.map.lock().expect("product cache lock poisoned");
        *guard = Arc::new(rebuilt);
        Ok(())
    }
}
