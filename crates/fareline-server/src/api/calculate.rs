use axum::{body::Bytes, extract::State, Extension, Json};

use fareline_core::{Deadline, PriceRequest};

use super::AppState;
use crate::error::ServiceError;
use crate::middleware::RequestId;
use crate::pipeline::PriceResponse;

/// `POST /taksa/api/1.0/route/calculate`
///
/// Parses the request, runs enrichment and the provider dispatch under the
/// configured deadline, and assembles the consolidated response.
pub async fn handle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<PriceResponse>, ServiceError> {
    let deadline = Deadline::after(state.wait_time);

    let mut request = PriceRequest::from_json(&body).map_err(|e| {
        state.collector.service_error("invalid_request", 0);
        ServiceError::BadRequest(e.to_string())
    })?;
    if request.is_incomplete() {
        return Err(ServiceError::BadRequest(
            "region or point is empty".to_string(),
        ));
    }
    request.req_id = req_id.0;

    state.service.evaluate(deadline, &mut request).await?;

    let price_coeff = state
        .region_price_coeff
        .for_region_or(request.region_id, state.price_coeff);
    let response = state.service.respond(deadline, &request, price_coeff).await?;
    Ok(Json(response))
}
