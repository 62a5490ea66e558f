//! The request-evaluation pipeline: enrichment, the concurrent provider
//! fan-out, tariff filtering, optimal selection, and response assembly.

mod record;
mod response;
mod routing;
mod selection;

pub use record::{PriceRanges, ServiceRecord};
pub use response::{Meta, PriceResponse};
pub use routing::{RouteClient, RouteError};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use fareline_catalog::{Product, ProductCache};
use fareline_core::{Deadline, PriceRequest};
use fareline_geo::{AreaResolver, GeoClient};
use fareline_metrics::Collector;
use fareline_providers::{CallContext, ProviderError, ProviderHttp, TaxiAdapter};

use crate::error::ServiceError;

/// The assembled price service. Wired once at startup; every field is shared
/// state safe to use from concurrent requests.
pub struct PriceService {
    adapters: HashMap<String, TaxiAdapter>,
    http: ProviderHttp,
    products: Arc<ProductCache>,
    geo: Arc<GeoClient>,
    route: Arc<RouteClient>,
    areas: Arc<AreaResolver>,
    collector: Arc<Collector>,
}

impl PriceService {
    #[must_use]
    pub fn new(
        adapters: HashMap<String, TaxiAdapter>,
        http: ProviderHttp,
        products: Arc<ProductCache>,
        geo: Arc<GeoClient>,
        route: Arc<RouteClient>,
        areas: Arc<AreaResolver>,
        collector: Arc<Collector>,
    ) -> Self {
        Self {
            adapters,
            http,
            products,
            geo,
            route,
            areas,
            collector,
        }
    }

    /// Health signal: at least one adapter and a non-empty product cache.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !self.adapters.is_empty() && self.products.is_ok()
    }

    /// Enrichment stage: reverse-geocode both points in parallel, replace the
    /// client coordinates with the canonical ones, and attach area names.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::EnrichmentFailed`] when either lookup fails;
    /// providers cannot be queried without authoritative points.
    pub async fn evaluate(
        &self,
        deadline: Deadline,
        request: &mut PriceRequest,
    ) -> Result<(), ServiceError> {
        let started = Instant::now();
        let (info1, info2) = tokio::join!(
            self.geo
                .point_info(deadline, request.point1.lat, request.point1.lon),
            self.geo
                .point_info(deadline, request.point2.lat, request.point2.lon),
        );
        tracing::debug!(
            req_id = %request.req_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluate: reverse geocode"
        );

        let info1 = info1.map_err(|source| {
            self.collector.service_error("webapi_point", request.region_id);
            ServiceError::EnrichmentFailed {
                point: "point1",
                source,
            }
        })?;
        let info2 = info2.map_err(|source| {
            self.collector.service_error("webapi_point", request.region_id);
            ServiceError::EnrichmentFailed {
                point: "point2",
                source,
            }
        })?;

        request
            .point1
            .apply_geo_info(&info1.address, info1.lat, info1.lon);
        request
            .point2
            .apply_geo_info(&info2.address, info2.lat, info2.lon);

        let area1 = self
            .areas
            .area_name(request.point1.lat, request.point1.lon);
        let area2 = self
            .areas
            .area_name(request.point2.lat, request.point2.lon);
        request.point1.set_area(&area1);
        request.point2.set_area(&area2);
        Ok(())
    }

    /// Dispatch stage: runs the provider fan-out and the router call as
    /// siblings under the same deadline, then selects the optimal record.
    ///
    /// A router failure drops `meta` but never the response; a records
    /// failure fails the request.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::RegionUnknown`]: no products for the region.
    /// - [`ServiceError::NoProviderData`]: every adapter failed or filtered
    ///   to nothing.
    pub async fn respond(
        &self,
        deadline: Deadline,
        request: &PriceRequest,
        price_coeff: f64,
    ) -> Result<PriceResponse, ServiceError> {
        let (records, meta) = tokio::join!(
            self.service_records(deadline, request),
            self.route.distance_time(deadline, request),
        );

        let (records, has_optimal_in_region) = match records {
            Ok(value) => value,
            Err(e) => {
                self.collector
                    .service_error("providers_empty", request.region_id);
                return Err(e);
            }
        };

        let meta = match meta {
            Ok((distance, time)) => Some(Meta { distance, time }),
            Err(e) => {
                tracing::warn!(req_id = %request.req_id, error = %e, "router failed, meta omitted");
                self.collector.service_error("router", request.region_id);
                None
            }
        };

        let (optimal, other) =
            selection::split_optimal(records, has_optimal_in_region, price_coeff);
        Ok(PriceResponse::new(meta, optimal, other))
    }

    /// Fan-out over every product whose provider has a registered adapter.
    /// One adapter's failure never blocks the others; results are collected
    /// as the sub-tasks finish.
    async fn service_records(
        &self,
        deadline: Deadline,
        request: &PriceRequest,
    ) -> Result<(Vec<ServiceRecord>, bool), ServiceError> {
        let products = self
            .products
            .get_products(request.region_id)
            .map_err(ServiceError::RegionUnknown)?;
        let has_optimal_in_region = products.iter().any(|p| p.is_optimal);

        let calls = products.iter().filter_map(|product| {
            let adapter = self.adapters.get(&product.provider_name)?;
            Some(self.request_one(deadline, request, adapter, product))
        });
        let results = futures::future::join_all(calls).await;

        let records: Vec<ServiceRecord> = results.into_iter().flatten().collect();
        if records.is_empty() {
            return Err(ServiceError::NoProviderData);
        }
        Ok((records, has_optimal_in_region))
    }

    /// One adapter sub-task: measure, call, classify failures, filter by the
    /// tariff whitelist, render records.
    async fn request_one(
        &self,
        deadline: Deadline,
        request: &PriceRequest,
        adapter: &TaxiAdapter,
        product: &Product,
    ) -> Vec<ServiceRecord> {
        let name = adapter.api_name();
        let ctx = CallContext {
            api_name: name,
            region_id: request.region_id,
            deadline,
        };

        let started = Instant::now();
        let reply = adapter.fetch(&self.http, &ctx, request).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        self.collector.provider_response_time(name, "all", elapsed_ms);

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(req_id = %request.req_id, provider = name, error = %e, "adapter failed");
                self.count_invalid(name, request.region_id, &e);
                return Vec::new();
            }
        };
        self.collector.provider_ok_response(name, request.region_id);

        if let Some(warning) = &reply.warning {
            tracing::warn!(req_id = %request.req_id, provider = name, error = %warning, "adapter warning");
            self.count_invalid(name, request.region_id, warning);
        }

        let total = reply.offers.len();
        let kept: Vec<_> = reply
            .offers
            .into_iter()
            .filter(|offer| product.is_good_tariff(&offer.tariff_name))
            .collect();
        if kept.is_empty() && total != 0 {
            tracing::warn!(req_id = %request.req_id, provider = name, "tariff filter dropped every offer");
            self.collector.filter_empty(name, request.region_id);
            return Vec::new();
        }

        kept.iter()
            .map(|offer| ServiceRecord::new(offer, product))
            .collect()
    }

    fn count_invalid(&self, name: &str, region_id: i32, error: &ProviderError) {
        match error {
            ProviderError::InvalidPrice(_) => {
                self.collector.provider_invalid_response(name, "price", region_id);
            }
            ProviderError::InvalidTime(_) => {
                self.collector.provider_invalid_response(name, "time", region_id);
            }
            _ => {}
        }
    }
}
