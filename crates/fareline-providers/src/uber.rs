use std::collections::HashMap;

use serde::Deserialize;

use fareline_core::{seconds_to_minutes, ApiData, Point, PriceRequest, UberSettings};

use crate::http::{CallContext, ProviderHttp};
use crate::{AdapterReply, ProviderError};

/// Uber exposes price and pickup-time estimates on separate endpoints; both
/// are requested concurrently. Prices are mandatory, times are best-effort.
pub struct UberApi {
    config: UberSettings,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    high_estimate: f64,
    #[serde(default)]
    low_estimate: f64,
}

#[derive(Debug, Deserialize)]
struct TimesResponse {
    #[serde(default)]
    times: Vec<Time>,
}

#[derive(Debug, Deserialize)]
struct Time {
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    estimate: i32,
}

/// Canonical tariff key for a lowercased upstream display name; empty when
/// the tariff is unknown to the whitelist vocabulary.
fn tariff_name(display: &str) -> &'static str {
    match display {
        "black" => "black",
        "uberblack" => "uberblack",
        "select" => "select",
        "uberselect" => "uberselect",
        "one" | "uberone" => "one",
        "xl" | "uberxl" => "uberxl",
        "x" | "uberx" => "uberx",
        "uberpop" => "uberpop",
        "uberstart" => "uberstart",
        "ubereconomy" => "ubereconomy",
        _ => "",
    }
}

fn display_name(display: &str) -> &'static str {
    match display {
        "black" | "uberblack" => "Uber BLACK",
        "select" | "uberselect" => "Uber SELECT",
        "one" | "uberone" => "Uber ONE",
        "xl" | "uberxl" => "Uber XL",
        "x" | "uberx" => "Uber X",
        _ => "Uber",
    }
}

impl UberApi {
    #[must_use]
    pub fn new(config: UberSettings) -> Self {
        Self { config }
    }

    pub(crate) fn api_name(&self) -> &str {
        &self.config.name
    }

    pub(crate) async fn fetch(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        request: &PriceRequest,
    ) -> Result<AdapterReply, ProviderError> {
        let (prices, times) = tokio::join!(
            self.prices(http, ctx, &request.point1, &request.point2),
            self.times(http, ctx, &request.point1),
        );

        let prices = prices?;
        let (times, warning) = match times {
            Ok(times) => (times, None),
            Err(e) => (TimesResponse { times: Vec::new() }, Some(e)),
        };

        let offers = self.to_offers(prices, &times, &request.point1, &request.point2);
        Ok(AdapterReply { offers, warning })
    }

    async fn prices(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        p1: &Point,
        p2: &Point,
    ) -> Result<PricesResponse, ProviderError> {
        let params = [
            ("start_latitude", p1.lat_str.as_str()),
            ("start_longitude", p1.lon_str.as_str()),
            ("end_latitude", p2.lat_str.as_str()),
            ("end_longitude", p2.lon_str.as_str()),
        ];
        let url = format!("{}{}", self.config.host, self.config.price_method);
        let response: PricesResponse = http
            .get_json(ctx, &url, &self.config.headers, &params)
            .await?;

        if response.prices.is_empty() {
            return Err(ProviderError::InvalidPrice("price list is empty".to_string()));
        }
        if response
            .prices
            .iter()
            .any(|p| (p.low_estimate + p.high_estimate) / 2.0 <= 0.0)
        {
            return Err(ProviderError::InvalidPrice("price <= 0".to_string()));
        }
        Ok(response)
    }

    async fn times(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        p1: &Point,
    ) -> Result<TimesResponse, ProviderError> {
        let params = [
            ("start_latitude", p1.lat_str.as_str()),
            ("start_longitude", p1.lon_str.as_str()),
        ];
        let url = format!("{}{}", self.config.host, self.config.time_method);
        let response: TimesResponse = http
            .get_json(ctx, &url, &self.config.headers, &params)
            .await?;

        if response.times.is_empty() {
            return Err(ProviderError::InvalidTime("time list is empty".to_string()));
        }
        if response.times.iter().any(|t| t.estimate <= 0) {
            return Err(ProviderError::InvalidTime("time <= 0".to_string()));
        }
        Ok(response)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_offers(
        &self,
        prices: PricesResponse,
        times: &TimesResponse,
        p1: &Point,
        p2: &Point,
    ) -> Vec<ApiData> {
        prices
            .prices
            .into_iter()
            .map(|price| {
                let eta_seconds = times
                    .times
                    .iter()
                    .find(|t| t.product_id == price.product_id)
                    .map_or(0, |t| t.estimate);
                let key = price.display_name.to_lowercase();
                ApiData {
                    display_name: display_name(&key).to_string(),
                    tariff_name: tariff_name(&key).to_string(),
                    price_min: price.low_estimate as i32,
                    price_max: price.high_estimate as i32,
                    price_mean: (price.low_estimate + price.high_estimate) / 2.0,
                    eta: seconds_to_minutes(eta_seconds),
                    template_vars: HashMap::from([
                        ("%from.lat%".to_string(), p1.lat_str.clone()),
                        ("%from.lon%".to_string(), p1.lon_str.clone()),
                        ("%from.address%".to_string(), p1.address.clone()),
                        ("%to.lat%".to_string(), p2.lat_str.clone()),
                        ("%to.lon%".to_string(), p2.lon_str.clone()),
                        ("%to.address%".to_string(), p2.address.clone()),
                        ("%product.id%".to_string(), price.product_id.clone()),
                        ("%client.id%".to_string(), self.config.client_id.clone()),
                    ]),
                    product_id: price.product_id,
                }
            })
            .collect()
    }
}
