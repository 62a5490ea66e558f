use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fareline_core::{ApiData, CitymobilSettings, Point, PriceRequest};

use crate::http::{CallContext, ProviderHttp};
use crate::{AdapterReply, ProviderError};

/// Citymobil quotes every requested tariff group in a single POST; there is
/// no separate ETA endpoint.
pub struct CitymobilApi {
    config: CitymobilSettings,
}

#[derive(Debug, Serialize)]
struct Order<'a> {
    latitude: &'a str,
    longitude: &'a str,
    del_latitude: &'a str,
    del_longitude: &'a str,
    tariff_group: Vec<i64>,
    method: &'a str,
    ver: &'a str,
    hurry: &'a str,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    prices: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(rename = "id_tariff_group")]
    tariff_group_id: i64,
    total_price: f64,
}

impl CitymobilApi {
    #[must_use]
    pub fn new(config: CitymobilSettings) -> Self {
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
        let prices = self
            .price(http, ctx, &request.point1, &request.point2)
            .await?;
        let offers = self.to_offers(prices, &request.point1, &request.point2);
        Ok(AdapterReply {
            offers,
            warning: None,
        })
    }

    async fn price(
        &self,
        http: &ProviderHttp,
        ctx: &CallContext<'_>,
        p1: &Point,
        p2: &Point,
    ) -> Result<PriceResponse, ProviderError> {
        let order = Order {
            latitude: &p1.lat_str,
            longitude: &p1.lon_str,
            del_latitude: &p2.lat_str,
            del_longitude: &p2.lon_str,
            tariff_group: self.config.tariff_groups.iter().map(|g| g.id).collect(),
            method: &self.config.price_method_name,
            ver: &self.config.ver,
            hurry: &self.config.hurry,
        };
        let url = format!("{}{}", self.config.host, self.config.price_method);
        let response: PriceResponse = http.post_json(ctx, &url, &HashMap::new(), &order).await?;

        if response.prices.is_empty() {
            return Err(ProviderError::InvalidPrice("price list is empty".to_string()));
        }
        if response.prices.iter().any(|p| p.total_price <= 0.0) {
            return Err(ProviderError::InvalidPrice("price <= 0".to_string()));
        }
        Ok(response)
    }

    fn to_offers(&self, response: PriceResponse, p1: &Point, p2: &Point) -> Vec<ApiData> {
        response
            .prices
            .into_iter()
            .map(|price| {
                let group_name = self
                    .config
                    .tariff_groups
                    .iter()
                    .find(|g| g.id == price.tariff_group_id)
                    .map(|g| g.name.as_str());
                let display_name = match group_name {
                    Some(name) => format!("Ситимобил {name}"),
                    None => "Ситимобил".to_string(),
                };
                ApiData {
                    display_name,
                    price_mean: price.total_price,
                    template_vars: HashMap::from([
                        ("%from.lat%".to_string(), p1.lat_str.clone()),
                        ("%from.lon%".to_string(), p1.lon_str.clone()),
                        ("%from.address%".to_string(), p1.address.clone()),
                        ("%to.lat%".to_string(), p2.lat_str.clone()),
                        ("%to.lon%".to_string(), p2.lon_str.clone()),
                        ("%to.address%".to_string(), p2.address.clone()),
                    ]),
                    ..ApiData::default()
                }
            })
            .collect()
    }
}
