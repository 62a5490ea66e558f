use std::collections::HashMap;

use sqlx::PgPool;
use url::Url;

use crate::{CatalogError, Product, ProductStore};

const ALL_PRODUCTS_QUERY: &str = "SELECT id, region_id, name, title, short_title, site_caption, \
     site_value, app_url, phone_caption, phone_value, android_app_url, android_app_id, \
     ios_app_url, ios_app_id, api_org_id, api_id, api_data, rating, avg_eta, is_active, \
     currency_code, handler, is_optimal FROM provider WHERE is_active=TRUE AND handler != ''";

const PROVIDER_IMAGE_BASE: &str = "https://disk.2gis.com/taksa-providers";

/// One row of the `provider` table. Rows sharing a `name` prefix fold into a
/// single [`Product`] whose tariff whitelist collects the suffixes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub id: i32,
    pub region_id: i32,
    pub name: String,
    pub title: String,
    pub short_title: Option<String>,
    pub site_caption: Option<String>,
    pub site_value: Option<String>,
    pub app_url: Option<String>,
    pub phone_caption: Option<String>,
    pub phone_value: Option<String>,
    pub android_app_url: Option<String>,
    pub android_app_id: Option<String>,
    pub ios_app_url: Option<String>,
    pub ios_app_id: Option<String>,
    pub api_org_id: i64,
    pub api_id: i64,
    pub api_data: Option<String>,
    pub rating: Option<f32>,
    pub avg_eta: Option<i32>,
    pub is_active: Option<bool>,
    pub currency_code: Option<String>,
    pub handler: String,
    pub is_optimal: bool,
}

impl ProviderRow {
    /// The logical product name: everything before the first `:`.
    fn name_prefix(&self) -> &str {
        self.name.split(':').next().unwrap_or("")
    }

    /// The tariff suffix: the second `:`-separated part, unless it repeats
    /// the prefix (the base-product row carries no tariff).
    fn tariff_suffix(&self) -> &str {
        let mut parts = self.name.split(':');
        let prefix = parts.next().unwrap_or("");
        match parts.next() {
            Some(suffix) if suffix != prefix => suffix,
            _ => "",
        }
    }

    fn is_invalid(&self) -> bool {
        self.region_id == 0 || self.handler.is_empty() || self.currency_code.is_none()
    }
}

/// Groups rows by region and folds same-prefix rows into products.
///
/// The whole load fails when any row misses a required field, so a broken
/// catalog never half-replaces a good one.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidRecord`] naming the offending row.
pub fn fold_rows(rows: Vec<ProviderRow>) -> Result<HashMap<i32, Vec<Product>>, CatalogError> {
    if let Some(bad) = rows.iter().find(|r| r.is_invalid()) {
        return Err(CatalogError::InvalidRecord {
            context: format!(
                "id {} name {:?} region {} handler {:?}",
                bad.id, bad.name, bad.region_id, bad.handler
            ),
        });
    }

    let mut by_region: HashMap<i32, Vec<Product>> = HashMap::new();
    let mut slot: HashMap<(i32, String), usize> = HashMap::new();

    for row in rows {
        let prefix = row.name_prefix().to_string();
        if prefix.is_empty() {
            tracing::warn!(id = row.id, region = row.region_id, "excluding unnamed provider row");
            continue;
        }

        let region_products = by_region.entry(row.region_id).or_default();
        let key = (row.region_id, prefix.clone());
        match slot.get(&key) {
            Some(&index) => {
                let suffix = row.tariff_suffix().to_string();
                region_products[index].add_tariff(&suffix);
            }
            None => {
                let suffix = row.tariff_suffix().to_string();
                slot.insert(key, region_products.len());
                let mut product = row_to_product(row, &prefix);
                product.add_tariff(&suffix);
                region_products.push(product);
            }
        }
    }

    by_region.retain(|_, products| !products.is_empty());
    Ok(by_region)
}

fn row_to_product(row: ProviderRow, prefix: &str) -> Product {
    Product {
        id: row.id,
        region_id: row.region_id,
        name: prefix.to_string(),
        tariffs: Vec::new(),
        title: row.title,
        short_title: row.short_title,
        site_caption: row.site_caption,
        site_value: row.site_value,
        app_url_template: row.app_url,
        phone_caption: row.phone_caption,
        phone_value: row.phone_value,
        android_app_url: row.android_app_url,
        android_app_id: row.android_app_id,
        ios_app_url: row.ios_app_url,
        ios_app_id: row.ios_app_id,
        api_org_id: row.api_org_id,
        api_id: row.api_id,
        api_data: row.api_data,
        rating: row.rating,
        avg_eta: row.avg_eta,
        provider_name: row.handler,
        currency_code: row.currency_code,
        image_url: image_url(prefix),
        is_optimal: row.is_optimal,
    }
}

/// Legacy image naming: a few providers publish their logo under an `_1`
/// alternative name.
fn image_url(name: &str) -> Option<Url> {
    let file_name = match name {
        "rutaxi" => "rutaxi_1",
        "citymobil" => "citymobil_1",
        other => other,
    };
    let path = format!("{PROVIDER_IMAGE_BASE}/provider_{file_name}.png");
    match Url::parse(&path) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!(name, error = %e, "cannot build provider image url");
            None
        }
    }
}

/// Postgres-backed product store.
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProductStore for PgProductStore {
    async fn load_all(&self) -> Result<HashMap<i32, Vec<Product>>, CatalogError> {
        let rows = sqlx::query_as::<_, ProviderRow>(ALL_PRODUCTS_QUERY)
            .fetch_all(&self.pool)
            .await?;
        fold_rows(rows)
    }
}
