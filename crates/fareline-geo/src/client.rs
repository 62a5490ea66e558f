//! HTTP client for the geo catalog upstream.
//!
//! Two operations are consumed by the pipeline: the nearest-building lookup
//! that turns client coordinates into an authoritative address + point, and
//! the region list that feeds the id→slug catalog.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use fareline_core::Deadline;

use crate::{parse_point, GeoError};

const DEFAULT_BASE_URL: &str = "http://catalog.api.2gis.ru";
const GEO_METHOD: &str = "2.0/geo/search";
const REGION_LIST_METHOD: &str = "2.0/region/list";

const GEO_KEY: &str = "ruvgco0172";
const REGION_LIST_KEY: &str = "navidev";

/// Nearest buildings only, single best item, within 250 m of the point.
const GEO_PARAMS: [(&str, &str); 6] = [
    ("key", GEO_KEY),
    ("type", "building"),
    ("fields", "items.context,items.geometry.centroid"),
    ("page", "1"),
    ("page_size", "1"),
    ("radius", "250"),
];

const REGION_LIST_PARAMS: [(&str, &str); 2] =
    [("key", REGION_LIST_KEY), ("fields", "items.code")];

/// The region list is refreshed from a background job, not a request path;
/// it gets its own fixed budget.
const REGION_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Authoritative data for a point: the nearest address and the canonical
/// building coordinates.
#[derive(Debug, Clone)]
pub struct PointInfo {
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

/// One region known to the upstream: numeric id plus the router slug.
#[derive(Debug, Clone)]
pub struct RegionInfo {
    pub id: i32,
    pub slug: String,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    code: i32,
}

#[derive(Debug, Deserialize)]
struct GeoAnswer {
    #[serde(default)]
    result: GeoResult,
}

#[derive(Debug, Default, Deserialize)]
struct GeoResult {
    #[serde(default)]
    items: Vec<GeoItem>,
}

#[derive(Debug, Deserialize)]
struct GeoItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address_name: String,
    #[serde(default)]
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
struct Geometry {
    #[serde(default)]
    centroid: String,
}

#[derive(Debug, Deserialize)]
struct RegionAnswer {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    result: RegionResult,
}

#[derive(Debug, Default, Deserialize)]
struct RegionResult {
    #[serde(default)]
    items: Vec<RegionItem>,
}

#[derive(Debug, Deserialize)]
struct RegionItem {
    #[serde(default)]
    id: String,
    #[serde(default)]
    code: String,
}

/// Client for the geo catalog. Use [`GeoClient::with_base_url`] to point at a
/// mock server in tests.
pub struct GeoClient {
    client: Client,
    base_url: Url,
}

impl GeoClient {
    /// Creates a client pointed at the production geo catalog, reusing the
    /// shared connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::BadBaseUrl`], which cannot happen for the
    /// built-in URL.
    pub fn new(client: Client) -> Result<Self, GeoError> {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::BadBaseUrl`] when `base_url` is not a valid URL.
    pub fn with_base_url(client: Client, base_url: &str) -> Result<Self, GeoError> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|e| GeoError::BadBaseUrl {
            url: normalized,
            reason: e.to_string(),
        })?;
        Ok(Self { client, base_url })
    }

    /// Returns the nearest address and canonical coordinates for a point.
    ///
    /// # Errors
    ///
    /// - [`GeoError::EmptyResult`]: nothing within the search radius.
    /// - [`GeoError::AddressNotFound`]: the best item has no usable name.
    /// - [`GeoError::NotAPoint`]: the item centroid cannot be parsed; the
    ///   caller cannot be served without canonical coordinates.
    /// - [`GeoError::DeadlineExceeded`] / [`GeoError::Http`] /
    ///   [`GeoError::UnexpectedStatus`] on transport problems.
    pub async fn point_info(
        &self,
        deadline: Deadline,
        lat: f64,
        lon: f64,
    ) -> Result<PointInfo, GeoError> {
        let point_param = format!("{lon},{lat}");
        let mut params: Vec<(&str, &str)> = vec![("point", &point_param)];
        params.extend_from_slice(&GEO_PARAMS);

        let answer: GeoAnswer = self
            .fetch(GEO_METHOD, &params, deadline.remaining())
            .await?;

        let Some(item) = answer.result.items.into_iter().next() else {
            return Err(GeoError::EmptyResult);
        };
        if item.address_name.is_empty() && item.name.is_empty() {
            return Err(GeoError::AddressNotFound);
        }

        let (lat, lon) = parse_point(&item.geometry.centroid)?;
        let address = if item.address_name.is_empty() {
            item.name
        } else {
            item.address_name
        };
        Ok(PointInfo { address, lat, lon })
    }

    /// Fetches the full region list.
    ///
    /// # Errors
    ///
    /// - [`GeoError::BadMetaCode`] when the envelope meta code is not 200.
    /// - [`GeoError::EmptyResult`] when the item list is empty.
    /// - [`GeoError::BadRegionId`] when an id is not numeric.
    /// - transport errors as for [`GeoClient::point_info`].
    pub async fn regions_list(&self) -> Result<Vec<RegionInfo>, GeoError> {
        let answer: RegionAnswer = self
            .fetch(REGION_LIST_METHOD, &REGION_LIST_PARAMS, REGION_LIST_TIMEOUT)
            .await?;

        if answer.meta.code != 200 {
            return Err(GeoError::BadMetaCode(answer.meta.code));
        }
        if answer.result.items.is_empty() {
            return Err(GeoError::EmptyResult);
        }

        let mut regions = Vec::with_capacity(answer.result.items.len());
        for item in answer.result.items {
            let id: i32 = item.id.parse().map_err(|_| GeoError::BadRegionId {
                raw: item.id.clone(),
            })?;
            regions.push(RegionInfo {
                id,
                slug: item.code,
            });
        }
        Ok(regions)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, GeoError> {
        let url = self.base_url.join(method).map_err(|e| GeoError::BadBaseUrl {
            url: format!("{}{method}", self.base_url),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(url.clone())
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(classify_transport)?;
        serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
            context: format!("geo catalog {method}"),
            source: e,
        })
    }
}

fn classify_transport(e: reqwest::Error) -> GeoError {
    if e.is_timeout() {
        GeoError::DeadlineExceeded
    } else {
        GeoError::Http(e)
    }
}
