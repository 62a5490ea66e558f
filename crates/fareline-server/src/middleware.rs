use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the price-request identifier end to end: clients may
/// supply it, the response echoes it, and the same value travels into
/// `PriceRequest.req_id` so adapter and router log lines correlate with the
/// HTTP exchange.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_ID_LEN: usize = 128;

/// Identifier of one price request, stored as a request extension. The
/// calculate handler copies it into the parsed `PriceRequest`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Accepts a client-supplied id when it is non-empty, short, and
    /// printable ASCII; anything else gets a fresh `UUIDv4`. Provider
    /// deeplinks and log pipelines downstream must never see an
    /// attacker-shaped id.
    fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(raw)
                if !raw.is_empty()
                    && raw.len() <= MAX_ID_LEN
                    && raw.chars().all(|c| c.is_ascii_graphic()) =>
            {
                Self(raw.to_string())
            }
            _ => Self(Uuid::new_v4().to_string()),
        }
    }
}

/// Axum middleware that tags every request with its id and runs the rest of
/// the stack inside a `req_id` span, so enrichment, fan-out, and selection
/// log lines all carry the id without threading it by hand.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_header(
        req.headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );

    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!("price_request", req_id = %id.0);
    let mut res = next.run(req).instrument(span).await;

    if let Ok(val) = HeaderValue::from_str(&id.0) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}
