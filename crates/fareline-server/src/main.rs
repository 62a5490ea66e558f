mod api;
mod error;
mod middleware;
mod pipeline;
mod scheduler;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use fareline_catalog::{PgProductStore, ProductCache, ProductStore};
use fareline_core::Settings;
use fareline_geo::{AreaResolver, GeoClient, RegionCatalog};
use fareline_metrics::Collector;
use fareline_providers::{build_adapters, ProviderHttp};

use api::AppState;
use pipeline::{PriceService, RouteClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = fareline_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load(&config.settings_path)?;
    tracing::info!(config = ?config, "starting with settings from {}", config.settings_path.display());

    let collector = Arc::new(Collector::new()?);

    let dsn = settings.store_dsn(&config)?;
    let pool = PgPoolOptions::new().max_connections(10).connect(&dsn).await?;
    let store: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool));
    let cache = Arc::new(ProductCache::new(store).await?);
    collector.mark_cache_reload();

    let adapter_count = settings.providers.configured_count().max(1);
    let http = ProviderHttp::new(Arc::clone(&collector), config.max_idle_per_host)?;
    let geo = Arc::new(GeoClient::new(http.client().clone())?);

    let regions = Arc::new(RegionCatalog::new());
    regions.load(geo.regions_list().await?);
    collector.mark_regions_reload();

    let route = Arc::new(RouteClient::new(http.clone(), Arc::clone(&regions)));
    let areas = Arc::new(AreaResolver::from_embedded()?);
    let adapters = build_adapters(&settings.providers);

    let service = Arc::new(PriceService::new(
        adapters,
        http,
        Arc::clone(&cache),
        Arc::clone(&geo),
        route,
        areas,
        Arc::clone(&collector),
    ));

    // Keep the handle alive: dropping it stops the reload jobs.
    let _scheduler = scheduler::build_scheduler(
        &settings,
        cache,
        geo,
        regions,
        Arc::clone(&collector),
    )
    .await?;

    let transport_info = Arc::new(serde_json::json!({
        "idle_conn_per_host": config.max_idle_per_host,
        "idle_conn": config.max_idle_per_host * adapter_count,
        "idle_conn_timeout": "5s",
    }));

    let state = AppState {
        service,
        collector,
        wait_time: settings.wait_time(),
        price_coeff: settings.price_coeff,
        region_price_coeff: settings.region_price_coeff.clone(),
        transport_info,
    };
    let app = api::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
