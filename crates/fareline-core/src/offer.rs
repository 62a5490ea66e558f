use std::collections::HashMap;

/// One offer from one provider, normalized to the shape the pipeline works
/// with. Adapters guarantee `price_mean > 0` for every offer they return.
#[derive(Debug, Clone, Default)]
pub struct ApiData {
    pub product_id: String,
    pub tariff_name: String,
    pub display_name: String,
    pub price_min: i32,
    pub price_max: i32,
    pub price_mean: f64,
    /// Pickup ETA in minutes; 0 means unknown.
    pub eta: i32,
    pub template_vars: HashMap<String, String>,
}

/// Converts an upstream ETA in seconds to whole minutes.
///
/// Sub-minute waits round up to one minute so the client never sees a zero
/// ETA for a car that is actually on its way.
#[must_use]
pub fn seconds_to_minutes(seconds: i32) -> i32 {
    if seconds == 0 {
        return 0;
    }
    if seconds < 60 {
        return 1;
    }
    seconds / 60
}
