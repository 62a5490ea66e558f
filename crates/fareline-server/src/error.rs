use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use fareline_catalog::CatalogError;
use fareline_geo::GeoError;

/// The client-visible failure kinds of a price request. Everything else
/// (single-adapter failures, router trouble, reload errors) stays internal
/// and only drives counters and logs.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot parse price request: {0}")]
    BadRequest(String),

    #[error("no products for the requested region")]
    RegionUnknown(#[source] CatalogError),

    #[error("no data from providers for this request")]
    NoProviderData,

    #[error("cannot evaluate address for {point}")]
    EnrichmentFailed {
        point: &'static str,
        #[source]
        source: GeoError,
    },
}

impl ServiceError {
    /// Root-cause tag carried into logs as `err_cause`.
    #[must_use]
    pub fn cause(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "invalid_request",
            ServiceError::RegionUnknown(_) => "region_unknown",
            ServiceError::NoProviderData => "providers_empty",
            ServiceError::EnrichmentFailed { .. } => "webapi_point",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::warn!(err_cause = self.cause(), error = %self, "price request failed");
        // Legacy surface: parse errors and downstream failures share 404.
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}
