mod calculate;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use fareline_core::RegionPriceCoeff;
use fareline_metrics::Collector;

use crate::middleware::request_id;
use crate::pipeline::PriceService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PriceService>,
    pub collector: Arc<Collector>,
    pub wait_time: Duration,
    pub price_coeff: f64,
    pub region_price_coeff: RegionPriceCoeff,
    pub transport_info: Arc<serde_json::Value>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/taksa/api/1.0/route/calculate", post(calculate::handle))
        .route("/healthcheck", get(healthcheck))
        .route("/info", get(info))
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.is_ok() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "")
    }
}

async fn info(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.transport_info.as_ref().clone())
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.collector.render(),
    )
}

#[cfg(test)]
#[path = "calculate_test.rs"]
mod tests;
