use std::collections::HashMap;
use std::sync::Mutex;

use crate::{GeoError, RegionInfo};

/// Mapping of numeric region ids to the router slugs. Reads are concurrent
/// with periodic wholesale replacement; the map is swapped, never mutated in
/// place, so readers cannot observe a half-loaded state.
#[derive(Default)]
pub struct RegionCatalog {
    map: Mutex<HashMap<i32, String>>,
}

impl RegionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole mapping with a freshly fetched region list.
    pub fn load(&self, regions: Vec<RegionInfo>) {
        let rebuilt: HashMap<i32, String> =
            regions.into_iter().map(|r| (r.id, r.slug)).collect();
        let mut guard = self.map.lock().expect("region catalog lock poisoned");
        *guard = rebuilt;
    }

    /// The router slug for a region id.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::RegionNotFound`] when the id is not in the
    /// current mapping.
    pub fn slug_by_id(&self, region_id: i32) -> Result<String, GeoError> {
        let guard = self.map.lock().expect("region catalog lock poisoned");
        guard
            .get(&region_id)
            .cloned()
            .ok_or(GeoError::RegionNotFound(region_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_lookup() {
        let catalog = RegionCatalog::new();
        catalog.load(vec![
            RegionInfo {
                id: 32,
                slug: "moscow".to_string(),
            },
            RegionInfo {
                id: 54,
                slug: "novosibirsk".to_string(),
            },
        ]);
        assert_eq!(catalog.slug_by_id(32).expect("slug"), "moscow");
        assert_eq!(catalog.slug_by_id(54).expect("slug"), "novosibirsk");
    }

    #[test]
    fn missing_region_reports_its_id() {
        let catalog = RegionCatalog::new();
        let err = catalog.slug_by_id(99).unwrap_err();
        assert_eq!(err.to_string(), "region name not found for id 99");
    }

    #[test]
    fn load_replaces_previous_mapping() {
        let catalog = RegionCatalog::new();
        catalog.load(vec![RegionInfo {
            id: 32,
            slug: "moscow".to_string(),
        }]);
        catalog.load(vec![RegionInfo {
            id: 77,
            slug: "kazan".to_string(),
        }]);
        assert!(catalog.slug_by_id(32).is_err());
        assert_eq!(catalog.slug_by_id(77).expect("slug"), "kazan");
    }
}
