use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppConfig, SettingsError};

/// Per-region override of the optimal-selection price coefficient, with a
/// global fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionPriceCoeff(HashMap<i32, f64>);

impl RegionPriceCoeff {
    #[must_use]
    pub fn for_region_or(&self, region_id: i32, fallback: f64) -> f64 {
        self.0.get(&region_id).copied().unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TariffGroup {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CitymobilSettings {
    pub name: String,
    pub host: String,
    pub price_method: String,
    pub price_method_name: String,
    #[serde(default)]
    pub tariff_groups: Vec<TariffGroup>,
    pub ver: String,
    pub hurry: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UberSettings {
    pub name: String,
    pub host: String,
    pub price_method: String,
    pub time_method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GettSettings {
    pub name: String,
    pub host: String,
    pub price_method: String,
    pub time_method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// The `taxi_services` block of the settings file. Providers left out of the
/// file are simply not registered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersSettings {
    pub gett: Option<GettSettings>,
    pub uber: Option<UberSettings>,
    pub citymobil: Option<CitymobilSettings>,
}

impl ProvidersSettings {
    /// Number of providers configured; drives the HTTP idle-pool sizing.
    #[must_use]
    pub fn configured_count(&self) -> usize {
        usize::from(self.gett.is_some())
            + usize::from(self.uber.is_some())
            + usize::from(self.citymobil.is_some())
    }
}

/// Service settings loaded from the JSON file named by
/// `FARELINE_SETTINGS_PATH`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "reload_cache_period_cron")]
    pub reload_cache_cron: String,
    #[serde(rename = "reload_regions_period_cron")]
    pub reload_regions_cron: String,
    pub wait_time_ms: u64,
    pub price_coeff: f64,
    #[serde(default)]
    pub region_price_coeff: RegionPriceCoeff,
    #[serde(default)]
    pub conn_str: String,
    #[serde(default, rename = "taxi_services")]
    pub providers: ProvidersSettings,
}

impl Settings {
    /// Reads and parses the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the file cannot be read and
    /// [`SettingsError::Parse`] when it is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&raw)?;
        Ok(settings)
    }

    /// Per-request deadline for the price pipeline.
    #[must_use]
    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    /// The store DSN: the settings file wins, the `FARELINE_DB_*` env parts
    /// are the fallback.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoStoreDsn`] when neither source is set.
    pub fn store_dsn(&self, config: &AppConfig) -> Result<String, SettingsError> {
        if !self.conn_str.is_empty() {
            return Ok(self.conn_str.clone());
        }
        config.store_dsn().ok_or(SettingsError::NoStoreDsn)
    }
}
