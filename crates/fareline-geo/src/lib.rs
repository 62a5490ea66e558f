//! Geo catalog client, area classification, and the region id→slug registry.

mod areas;
mod centroid;
mod client;
mod regions;

pub use areas::AreaResolver;
pub use centroid::parse_point;
pub use client::{GeoClient, PointInfo, RegionInfo};
pub use regions::RegionCatalog;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("geo catalog returned an empty item list")]
    EmptyResult,

    #[error("no address found near the point")]
    AddressNotFound,

    #[error("cannot parse POINT from centroid string: {0}")]
    NotAPoint(String),

    #[error("geo catalog meta code is {0}, expected 200")]
    BadMetaCode(i32),

    #[error("cannot parse region id {raw:?}")]
    BadRegionId { raw: String },

    #[error("region name not found for id {0}")]
    RegionNotFound(i32),

    #[error("geo catalog request exceeded its time budget")]
    DeadlineExceeded,

    #[error("invalid base URL {url:?}: {reason}")]
    BadBaseUrl { url: String, reason: String },

    #[error("cannot parse area geometry: {0}")]
    BadAreaGeometry(String),
}
