use serde::Serialize;

use super::record::ServiceRecord;

const OPTIMAL_SUMMARY: &str = "Оптимальный выбор с учётом рейтинга перевозчика и популярности";

/// Road distance and travel time between the two points, attached to the
/// response when the router answered in time.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Meta {
    pub distance: i32,
    pub time: i32,
}

impl Meta {
    /// A zero/zero meta carries no information and is dropped from the
    /// response.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.distance == 0 && self.time == 0
    }
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    #[serde(rename = "results")]
    result: ResultsBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
struct ResultsBlock {
    id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    optimal: Option<Section>,
    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    other: Option<Section>,
}

#[derive(Debug, Serialize)]
struct Section {
    title: String,
    summary: String,
    results: Vec<ServiceRecord>,
}

impl PriceResponse {
    #[must_use]
    pub fn new(meta: Option<Meta>, optimal: Vec<ServiceRecord>, other: Vec<ServiceRecord>) -> Self {
        let optimal = (!optimal.is_empty()).then(|| Section {
            title: String::new(),
            summary: OPTIMAL_SUMMARY.to_string(),
            results: optimal,
        });
        let other = (!other.is_empty()).then(|| Section {
            title: String::new(),
            summary: String::new(),
            results: other,
        });
        PriceResponse {
            result: ResultsBlock {
                id: -1,
                optimal,
                other,
            },
            meta: meta.filter(|m| !m.is_empty()),
        }
    }
}
