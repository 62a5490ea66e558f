use serde::Deserialize;

/// One end of the requested route.
///
/// The string forms are derived from the floats and regenerated whenever the
/// coordinates change; provider wire formats take the strings verbatim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip)]
    pub lat_str: String,
    #[serde(skip)]
    pub lon_str: String,
    #[serde(skip)]
    pub address: String,
    #[serde(skip)]
    pub area: String,
}

impl Point {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        let mut point = Point {
            lat,
            lon,
            ..Point::default()
        };
        point.stringify();
        point
    }

    /// A point with a zero coordinate never comes from a real client and is
    /// rejected at parse time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lat == 0.0 || self.lon == 0.0
    }

    /// Replaces the client-supplied coordinates with the authoritative ones
    /// from the geo catalog and attaches the nearest address.
    pub fn apply_geo_info(&mut self, address: &str, lat: f64, lon: f64) {
        self.address = address.to_string();
        self.lat = lat;
        self.lon = lon;
        self.stringify();
    }

    pub fn set_area(&mut self, area: &str) {
        self.area = area.to_string();
    }

    fn stringify(&mut self) {
        self.lat_str = self.lat.to_string();
        self.lon_str = self.lon.to_string();
    }
}

/// A parsed price request. Created by the HTTP handler, mutated once by the
/// enrichment stage, then read-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceRequest {
    #[serde(skip)]
    pub req_id: String,
    pub region_id: i32,
    pub point1: Point,
    pub point2: Point,
    #[serde(default)]
    pub only_api: bool,
}

impl PriceRequest {
    /// Parses a request body and regenerates the derived string coordinates.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for malformed JSON.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut request: PriceRequest = serde_json::from_slice(body)?;
        request.point1.stringify();
        request.point2.stringify();
        Ok(request)
    }

    /// True when the request misses a region or either point.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.region_id == 0 || self.point1.is_empty() || self.point2.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_and_derives_strings() {
        let body = br#"{"region_id": 32, "point1": {"lat": 55.750376, "lon": 37.610621}, "point2": {"lat": 55.760736, "lon": 37.62002}}"#;
        let request = PriceRequest::from_json(body).expect("request");
        assert_eq!(request.region_id, 32);
        assert_eq!(request.point1.lat_str, "55.750376");
        assert_eq!(request.point2.lon_str, "37.62002");
        assert!(!request.only_api);
        assert!(!request.is_incomplete());
    }

    #[test]
    fn zero_coordinate_marks_request_incomplete() {
        let body =
            br#"{"region_id": 32, "point1": {"lat": 0, "lon": 37.6}, "point2": {"lat": 55.7, "lon": 37.6}}"#;
        let request = PriceRequest::from_json(body).expect("request");
        assert!(request.point1.is_empty());
        assert!(request.is_incomplete());
    }

    #[test]
    fn missing_region_marks_request_incomplete() {
        let body = br#"{"point1": {"lat": 55.7, "lon": 37.6}, "point2": {"lat": 55.8, "lon": 37.7}}"#;
        let request = PriceRequest::from_json(body).expect("request");
        assert!(request.is_incomplete());
    }

    #[test]
    fn geo_info_overwrites_coordinates_and_strings() {
        let mut point = Point::new(55.0, 37.0);
        point.apply_geo_info("Тверская 1", 55.757895, 37.611731);
        assert_eq!(point.address, "Тверская 1");
        assert_eq!(point.lat_str, "55.757895");
        assert_eq!(point.lon_str, "37.611731");
    }
}
