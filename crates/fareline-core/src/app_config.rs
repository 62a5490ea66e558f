use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub settings_path: PathBuf,
    pub db_login: String,
    pub db_password: String,
    pub db_url: String,
    pub max_idle_per_host: usize,
}

impl AppConfig {
    /// Builds a Postgres DSN from the `FARELINE_DB_*` parts, or `None` when
    /// the host part was not configured.
    #[must_use]
    pub fn store_dsn(&self) -> Option<String> {
        if self.db_url.is_empty() {
            return None;
        }
        Some(format!(
            "postgres://{}:{}@{}?sslmode=disable",
            self.db_login, self.db_password, self.db_url
        ))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("settings_path", &self.settings_path)
            .field("db_login", &self.db_login)
            .field("db_password", &"[redacted]")
            .field("db_url", &self.db_url)
            .field("max_idle_per_host", &self.max_idle_per_host)
            .finish()
    }
}
