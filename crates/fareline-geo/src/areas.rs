use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::Deserialize;

use crate::GeoError;

/// Named areas bundled with the binary. Each geometry string is a closed ring
/// of comma-separated `lon lat` pairs.
const AREAS_JSON: &str = include_str!("../data/areas.json");

#[derive(Debug, Deserialize)]
struct AreaSpec {
    name: String,
    geometry: Vec<String>,
}

struct Area {
    name: String,
    loops: Vec<Polygon<f64>>,
}

impl Area {
    fn contains(&self, point: Point<f64>) -> bool {
        self.loops.iter().any(|l| l.contains(&point))
    }
}

/// Classifies coordinates into the named areas some providers price
/// differently. The table is parsed once at startup and immutable afterwards.
pub struct AreaResolver {
    areas: Vec<Area>,
}

impl AreaResolver {
    /// Parses the embedded area table.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::BadAreaGeometry`] when the resource is malformed;
    /// the table ships with the binary, so this is a build defect surfacing
    /// at startup.
    pub fn from_embedded() -> Result<Self, GeoError> {
        Self::from_json(AREAS_JSON)
    }

    fn from_json(raw: &str) -> Result<Self, GeoError> {
        let specs: Vec<AreaSpec> = serde_json::from_str(raw)
            .map_err(|e| GeoError::BadAreaGeometry(format!("area table json: {e}")))?;

        let mut areas = Vec::with_capacity(specs.len());
        for spec in specs {
            let mut loops = Vec::with_capacity(spec.geometry.len());
            for ring in &spec.geometry {
                loops.push(parse_ring(ring)?);
            }
            areas.push(Area {
                name: spec.name,
                loops,
            });
        }
        Ok(Self { areas })
    }

    /// The name of the first area containing the point, or `""` when the
    /// point lies outside every area. Linear scan: the table holds tens of
    /// entries and this runs twice per request.
    #[must_use]
    pub fn area_name(&self, lat: f64, lon: f64) -> String {
        let point = Point::new(lon, lat);
        self.areas
            .iter()
            .find(|area| area.contains(point))
            .map(|area| area.name.clone())
            .unwrap_or_default()
    }
}

fn parse_ring(ring: &str) -> Result<Polygon<f64>, GeoError> {
    let mut coords = Vec::new();
    for pair in ring.split(',') {
        let pair = pair.trim();
        let mut parts = pair.split_whitespace();
        let (Some(lon_str), Some(lat_str)) = (parts.next(), parts.next()) else {
            return Err(GeoError::BadAreaGeometry(format!(
                "cannot split coord pair {pair:?}"
            )));
        };
        let lon: f64 = lon_str.parse().map_err(|_| {
            GeoError::BadAreaGeometry(format!("cannot parse lon from {lon_str:?}"))
        })?;
        let lat: f64 = lat_str.parse().map_err(|_| {
            GeoError::BadAreaGeometry(format!("cannot parse lat from {lat_str:?}"))
        })?;
        coords.push(Coord { x: lon, y: lat });
    }
    Ok(Polygon::new(LineString::new(coords), Vec::new()))
}
