use std::collections::HashMap;

use serde::Deserialize;

use fareline_core::{seconds_to_minutes, ApiData, GettSettings, Point, PriceRequest};

use crate::http::{CallContext, ProviderHttp};
use crate::{AdapterReply, ProviderError};

/// Gett quotes price and pickup ETA on separate endpoints, requested
/// concurrently; a failed ETA downgrades to a warning.
pub struct GettApi {
    config: GettSettings,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    prices: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    product_id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    low_estimate: i32,
    #[serde(default)]
    high_estimate: i32,
}

#[derive(Debug, Deserialize)]
struct EtasResponse {
    #[serde(default)]
    etas: Vec<Eta>,
}

#[derive(Debug, Deserialize)]
struct Eta {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    eta: i32,
}

/// Upstream display names are Russian marketing labels; the whitelist speaks
/// stable tariff keys.
fn tariff_name(display: &str) -> &'static str {
    match display {
        "Эконом" => "gett_economy",
        "Комфорт" => "gett_comfort",
        "Бизнес" => "gett_business",
        "Минимум" => "gett_mini",
        "Эконом+" => "gett_economy_plus",
        "Подмосковье" => "gett_premoscow",
        "Стандарт" => "gett_standart",
        _ => "",
    }
}

impl GettApi {
    #[must_use]
    pub fn new(config: GettSettings) -> Self {
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
        let (prices, etas) = tokio::join!(
            self.prices(http, ctx, &request.point1, &request.point2),
            self.etas(http, ctx, &request.point1),
        );

        let prices = prices?;
        let (etas, warning) = match etas {
            Ok(etas) => (etas, None),
            Err(e) => (EtasResponse { etas: Vec::new() }, Some(e)),
        };

        let offers = self.to_offers(prices, &etas, &request.point1, &request.point2);
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
            ("pickup_latitude", p1.lat_str.as_str()),
            ("pickup_longitude", p1.lon_str.as_str()),
            ("destination_latitude", p2.lat_str.as_str()),
            ("destination_longitude", p2.lon_str.as_str()),
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
            .any(|p| f64::from(p.low_estimate + p.high_estimate) / 2.0 <= 0.0)
        {
            return Err(ProviderError::InvalidPrice("price <= 0".to_string()));
        }
        Ok(response)
    }

    async fn etas(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        p1: &Point,
    ) -> Result<EtasResponse, ProviderError> {
        let params = [
            ("latitude", p1.lat_str.as_str()),
            ("longitude", p1.lon_str.as_str()),
        ];
        let url = format!("{}{}", self.config.host, self.config.time_method);
        let response: EtasResponse = http
            .get_json(ctx, &url, &self.config.headers, &params)
            .await?;

        if response.etas.is_empty() {
            return Err(ProviderError::InvalidTime("time list is empty".to_string()));
        }
        if response.etas.iter().any(|e| e.eta <= 0) {
            return Err(ProviderError::InvalidTime("time <= 0".to_string()));
        }
        Ok(response)
    }

    fn to_offers(
        &self,
        prices: PricesResponse,
        etas: &EtasResponse,
        p1: &Point,
        p2: &Point,
    ) -> Vec<ApiData> {
        prices
            .prices
            .into_iter()
            .map(|price| {
                let eta_seconds = etas
                    .etas
                    .iter()
                    .find(|e| e.display_name.to_lowercase() == price.display_name.to_lowercase())
                    .map_or(0, |e| e.eta);
                ApiData {
                    display_name: format!("Gett {}", price.display_name),
                    tariff_name: tariff_name(&price.display_name).to_string(),
                    price_min: price.low_estimate,
                    price_max: price.high_estimate,
                    price_mean: f64::from(price.low_estimate + price.high_estimate) / 2.0,
                    eta: seconds_to_minutes(eta_seconds),
                    template_vars: HashMap::from([
                        ("%from.lat%".to_string(), p1.lat_str.clone()),
                        ("%from.lon%".to_string(), p1.lon_str.clone()),
                        ("%to.lat%".to_string(), p2.lat_str.clone()),
                        ("%to.lon%".to_string(), p2.lon_str.clone()),
                        ("%product.id%".to_string(), price.product_id.clone()),
                    ]),
                    product_id: price.product_id,
                }
            })
            .collect()
    }
}
