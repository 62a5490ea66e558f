//! Background reload jobs.
//!
//! Two cron entries refresh the product cache and the region list. Neither
//! blocks request handling; a failed run logs, keeps the previous snapshot,
//! and leaves the reload gauge untouched.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use fareline_catalog::ProductCache;
use fareline_core::Settings;
use fareline_geo::{GeoClient, RegionCatalog};
use fareline_metrics::Collector;

/// Builds and starts the scheduler with both reload jobs registered.
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it shuts down the jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] when a cron expression is invalid or the
/// scheduler cannot start.
pub async fn build_scheduler(
    settings: &Settings,
    cache: Arc<ProductCache>,
    geo: Arc<GeoClient>,
    regions: Arc<RegionCatalog>,
    collector: Arc<Collector>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_cache_job(
        &scheduler,
        &settings.reload_cache_cron,
        cache,
        Arc::clone(&collector),
    )
    .await?;
    register_regions_job(
        &scheduler,
        &settings.reload_regions_cron,
        geo,
        regions,
        collector,
    )
    .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_cache_job(
    scheduler: &JobScheduler,
    cron: &str,
    cache: Arc<ProductCache>,
    collector: Arc<Collector>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);
        let collector = Arc::clone(&collector);
        Box::pin(async move {
            match cache.reload().await {
                Ok(()) => {
                    collector.mark_cache_reload();
                    tracing::info!("scheduler: product cache reloaded");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: product cache reload failed");
                }
            }
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}

async fn register_regions_job(
    scheduler: &JobScheduler,
    cron: &str,
    geo: Arc<GeoClient>,
    regions: Arc<RegionCatalog>,
    collector: Arc<Collector>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let geo = Arc::clone(&geo);
        let regions = Arc::clone(&regions);
        let collector = Arc::clone(&collector);
        Box::pin(async move {
            match geo.regions_list().await {
                Ok(list) => {
                    regions.load(list);
                    collector.mark_regions_reload();
                    tracing::info!("scheduler: region list reloaded");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: region list reload failed");
                }
            }
        })
    })?;
    scheduler.add(job).await?;
    Ok(())
}
