//! Provider adapters.
//!
//! Every adapter maps the abstract price request onto one upstream taxi API
//! and returns validated offers. The set of providers is closed, so dispatch
//! is a tagged enum rather than trait objects; the registry is keyed by the
//! adapter's stable `api_name`, which products reference as `provider_name`.

mod citymobil;
mod error;
mod gett;
mod http;
mod uber;

pub use citymobil::CitymobilApi;
pub use error::ProviderError;
pub use gett::GettApi;
pub use http::{CallContext, ProviderHttp};
pub use uber::UberApi;

use std::collections::HashMap;

use fareline_core::{ApiData, PriceRequest, ProvidersSettings};

/// What an adapter call produced: zero or more validated offers, plus an
/// optional non-fatal warning (a failed ETA leg). Offers always satisfy
/// `price_mean > 0`.
#[derive(Debug)]
pub struct AdapterReply {
    pub offers: Vec<ApiData>,
    pub warning: Option<ProviderError>,
}

/// One configured provider adapter.
pub enum TaxiAdapter {
    Citymobil(CitymobilApi),
    Uber(UberApi),
    Gett(GettApi),
}

impl TaxiAdapter {
    /// Stable key matched against `Product::provider_name`.
    #[must_use]
    pub fn api_name(&self) -> &str {
        match self {
            TaxiAdapter::Citymobil(api) => api.api_name(),
            TaxiAdapter::Uber(api) => api.api_name(),
            TaxiAdapter::Gett(api) => api.api_name(),
        }
    }

    /// Queries the provider's upstream under the call deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidPrice`] when the upstream quotes no
    /// usable price, and transport/deserialization errors otherwise. A
    /// failed ETA leg is not an error: it comes back as
    /// [`AdapterReply::warning`] with the offers intact.
    pub async fn fetch(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        request: &PriceRequest,
    ) -> Result<AdapterReply, ProviderError> {
        match self {
            TaxiAdapter::Citymobil(api) => api.fetch(http, ctx, request).await,
            TaxiAdapter::Uber(api) => api.fetch(http, ctx, request).await,
            TaxiAdapter::Gett(api) => api.fetch(http, ctx, request).await,
        }
    }
}

/// Builds the adapter registry from the settings block. Providers missing
/// from the settings are simply absent from the registry.
#[must_use]
pub fn build_adapters(settings: &ProvidersSettings) -> HashMap<String, TaxiAdapter> {
    let mut adapters = HashMap::new();
    if let Some(config) = &settings.gett {
        let api = GettApi::new(config.clone());
        adapters.insert(api.api_name().to_string(), TaxiAdapter::Gett(api));
    }
    if let Some(config) = &settings.uber {
        let api = UberApi::new(config.clone());
        adapters.insert(api.api_name().to_string(), TaxiAdapter::Uber(api));
    }
    if let Some(config) = &settings.citymobil {
        let api = CitymobilApi::new(config.clone());
        adapters.insert(api.api_name().to_string(), TaxiAdapter::Citymobil(api));
    }
    adapters
}
