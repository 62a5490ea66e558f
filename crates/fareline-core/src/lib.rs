mod app_config;
mod config;
mod deadline;
mod offer;
mod request;
mod settings;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use deadline::Deadline;
pub use offer::{seconds_to_minutes, ApiData};
pub use request::{Point, PriceRequest};
pub use settings::{
    CitymobilSettings, GettSettings, ProvidersSettings, RegionPriceCoeff, Settings, TariffGroup,
    UberSettings,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse settings json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings are empty: no store DSN in the file or the environment")]
    NoStoreDsn,
}
