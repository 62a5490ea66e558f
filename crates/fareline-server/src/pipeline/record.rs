use serde::Serialize;

use fareline_catalog::{Operator, Product};
use fareline_core::ApiData;

/// One row of the response: an offer merged with its product's presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceRecord {
    pub avg_eta: Option<i32>,
    pub price: i32,
    pub price_ranges: Option<PriceRanges>,
    pub rating: Option<f32>,
    pub operator: Operator,
    pub eta: Option<i32>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceRanges {
    pub min: i32,
    pub max: i32,
}

impl ServiceRecord {
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn new(offer: &ApiData, product: &Product) -> Self {
        let eta = (offer.eta > 0).then_some(offer.eta);
        let rating = product.rating.filter(|r| *r > 0.0);
        let price_ranges = (offer.price_min > 0 && offer.price_max > 0).then(|| PriceRanges {
            min: offer.price_min,
            max: offer.price_max,
        });

        ServiceRecord {
            avg_eta: product.avg_eta,
            price: offer.price_mean as i32,
            price_ranges,
            rating,
            operator: product.operator(&offer.display_name, &offer.template_vars),
            eta,
            currency_code: product.currency_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn offer() -> ApiData {
        ApiData {
            display_name: "Uber X".to_string(),
            price_min: 100,
            price_max: 300,
            price_mean: 200.0,
            eta: 5,
            template_vars: HashMap::new(),
            ..ApiData::default()
        }
    }

    fn product() -> Product {
        Product {
            id: 1,
            region_id: 32,
            name: "uber".to_string(),
            title: "Uber".to_string(),
            provider_name: "uber".to_string(),
            currency_code: Some("RUB".to_string()),
            avg_eta: Some(10),
            rating: Some(4.5),
            ..Product::default()
        }
    }

    #[test]
    fn carries_price_ranges_eta_and_rating() {
        let record = ServiceRecord::new(&offer(), &product());
        assert_eq!(record.price, 200);
        let ranges = record.price_ranges.expect("ranges");
        assert_eq!((ranges.min, ranges.max), (100, 300));
        assert_eq!(record.eta, Some(5));
        assert_eq!(record.avg_eta, Some(10));
        assert_eq!(record.rating, Some(4.5));
        assert_eq!(record.currency_code.as_deref(), Some("RUB"));
    }

    #[test]
    fn mean_price_is_truncated() {
        let mut data = offer();
        data.price_mean = 249.9;
        assert_eq!(ServiceRecord::new(&data, &product()).price, 249);
    }

    #[test]
    fn ranges_omitted_when_either_bound_is_zero() {
        let mut data = offer();
        data.price_min = 0;
        assert!(ServiceRecord::new(&data, &product()).price_ranges.is_none());
    }

    #[test]
    fn zero_eta_serializes_as_null() {
        let mut data = offer();
        data.eta = 0;
        let record = ServiceRecord::new(&data, &product());
        assert!(record.eta.is_none());
        let json = serde_json::to_value(&record).expect("json");
        assert!(json["eta"].is_null());
    }

    #[test]
    fn non_positive_rating_is_dropped() {
        let mut prod = product();
        prod.rating = Some(0.0);
        assert!(ServiceRecord::new(&offer(), &prod).rating.is_none());
    }
}
