//! Road-router client: distance and travel time between the two points.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fareline_core::{Deadline, PriceRequest};
use fareline_geo::{GeoError, RegionCatalog};
use fareline_providers::{CallContext, ProviderError, ProviderHttp};

const DEFAULT_BASE_URL: &str = "http://routing.2gis.com/carrouting/4.0.0/";
const API_NAME: &str = "router";

const OUTPUT: &str = "simple";
const REQ_TYPE: &str = "jam";
const POINT_TYPE: &str = "stop";

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("cannot resolve region slug")]
    Region(#[from] GeoError),

    #[error("router upstream failed")]
    Upstream(#[from] ProviderError),

    #[error("router returned an empty result")]
    EmptyResult,

    #[error("router returned an invalid result: length {length}, duration {duration}")]
    InvalidResult { length: i32, duration: i32 },
}

#[derive(Debug, Serialize)]
struct RoutePoint {
    #[serde(rename = "type")]
    kind: &'static str,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize)]
struct RouteBody {
    output: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    points: Vec<RoutePoint>,
}

#[derive(Debug, Deserialize)]
struct RouteAnswer {
    #[serde(default)]
    result: Vec<RouteResult>,
}

#[derive(Debug, Deserialize)]
struct RouteResult {
    #[serde(default)]
    duration: i32,
    #[serde(default)]
    length: i32,
}

/// Client for the road router. The region slug in the URL path comes from the
/// region catalog; calls share the provider HTTP plumbing so router traffic
/// shows up in the same counters.
pub struct RouteClient {
    http: ProviderHttp,
    base_url: String,
    regions: Arc<RegionCatalog>,
}

impl RouteClient {
    #[must_use]
    pub fn new(http: ProviderHttp, regions: Arc<RegionCatalog>) -> Self {
        Self::with_base_url(http, regions, DEFAULT_BASE_URL)
    }

    /// Custom base URL for tests.
    #[must_use]
    pub fn with_base_url(http: ProviderHttp, regions: Arc<RegionCatalog>, base_url: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            regions,
        }
    }

    /// Returns `(length_meters, duration_minutes)` for the requested route.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Region`] when the region id has no slug.
    /// - [`RouteError::EmptyResult`] on an empty result list.
    /// - [`RouteError::InvalidResult`] when length or duration is negative.
    /// - [`RouteError::Upstream`] on transport failures; the caller treats
    ///   every variant as non-fatal to the overall request.
    pub async fn distance_time(
        &self,
        deadline: Deadline,
        request: &PriceRequest,
    ) -> Result<(i32, i32), RouteError> {
        let slug = self.regions.slug_by_id(request.region_id)?;
        let url = format!("{}{slug}", self.base_url);

        let body = RouteBody {
            output: OUTPUT,
            kind: REQ_TYPE,
            points: vec![
                RoutePoint {
                    kind: POINT_TYPE,
                    x: request.point1.lon,
                    y: request.point1.lat,
                },
                RoutePoint {
                    kind: POINT_TYPE,
                    x: request.point2.lon,
                    y: request.point2.lat,
                },
            ],
        };
        let headers = HashMap::from([(
            "X-Internal-Service".to_string(),
            "FARELINE".to_string(),
        )]);
        let ctx = CallContext {
            api_name: API_NAME,
            region_id: request.region_id,
            deadline,
        };

        let answer: RouteAnswer = self.http.post_json(&ctx, &url, &headers, &body).await?;
        let Some(route) = answer.result.first() else {
            return Err(RouteError::EmptyResult);
        };
        if route.length < 0 || route.duration < 0 {
            return Err(RouteError::InvalidResult {
                length: route.length,
                duration: route.duration,
            });
        }
        Ok((route.length, route.duration / 60))
    }
}
