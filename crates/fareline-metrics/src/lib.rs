//! Service metrics.
//!
//! One [`Collector`] owns a private prometheus registry with every counter,
//! gauge, and histogram the service emits. Handing the registry around as a
//! value (instead of the process-global default) keeps tests isolated.

use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

const NAMESPACE: &str = "fareline";
const PROVIDERS: &str = "providers";
const SERVICE: &str = "service";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error(transparent)]
    Prometheus(#[from] prometheus::Error),
}

/// Counters and gauges per (provider, region, outcome), plus the two reload
/// gauges. Cheap to clone; all handles share the same registry.
#[derive(Clone)]
pub struct Collector {
    registry: Registry,
    provider_request: IntCounterVec,
    provider_error: IntCounterVec,
    provider_invalid: IntCounterVec,
    provider_ok: IntCounterVec,
    provider_timeout: IntCounterVec,
    provider_response_time: HistogramVec,
    service_error: IntCounterVec,
    filter_empty: IntCounterVec,
    cache_reload: Gauge,
    regions_reload: Gauge,
}

impl Collector {
    /// Builds the collector and registers every metric in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Prometheus`] when a metric cannot be built or
    /// registered (duplicate names, bad buckets).
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let provider_request = IntCounterVec::new(
            provider_opts("request", "Requests sent to providers"),
            &["name", "region"],
        )?;
        let provider_error = IntCounterVec::new(
            provider_opts("error_response", "Non-2xx responses from providers"),
            &["name", "method", "code", "region"],
        )?;
        let provider_invalid = IntCounterVec::new(
            provider_opts("invalid_response", "Provider responses with invalid data"),
            &["name", "cause", "region"],
        )?;
        let provider_ok = IntCounterVec::new(
            provider_opts("ok_response", "Good responses from providers"),
            &["name", "region"],
        )?;
        let provider_timeout = IntCounterVec::new(
            provider_opts("request_timeout", "Provider requests cut by the deadline"),
            &["name", "region"],
        )?;
        let provider_response_time = HistogramVec::new(
            HistogramOpts::new("response_time", "Provider response time, ms")
                .namespace(NAMESPACE)
                .subsystem(PROVIDERS)
                .buckets(prometheus::linear_buckets(200.0, 200.0, 6)?),
            &["name", "method"],
        )?;
        let service_error = IntCounterVec::new(
            service_opts("error_response", "Bad responses from the service"),
            &["cause", "region"],
        )?;
        let filter_empty = IntCounterVec::new(
            service_opts(
                "filter_empty",
                "Provider replies where the tariff filter dropped every offer",
            ),
            &["name", "region"],
        )?;
        let cache_reload = Gauge::with_opts(service_opts(
            "cache_reload",
            "Unix time of the last successful product cache reload",
        ))?;
        let regions_reload = Gauge::with_opts(service_opts(
            "regions_reload",
            "Unix time of the last successful region list reload",
        ))?;

        registry.register(Box::new(provider_request.clone()))?;
        registry.register(Box::new(provider_error.clone()))?;
        registry.register(Box::new(provider_invalid.clone()))?;
        registry.register(Box::new(provider_ok.clone()))?;
        registry.register(Box::new(provider_timeout.clone()))?;
        registry.register(Box::new(provider_response_time.clone()))?;
        registry.register(Box::new(service_error.clone()))?;
        registry.register(Box::new(filter_empty.clone()))?;
        registry.register(Box::new(cache_reload.clone()))?;
        registry.register(Box::new(regions_reload.clone()))?;

        Ok(Self {
            registry,
            provider_request,
            provider_error,
            provider_invalid,
            provider_ok,
            provider_timeout,
            provider_response_time,
            service_error,
            filter_empty,
            cache_reload,
            regions_reload,
        })
    }

    pub fn provider_request(&self, name: &str, region_id: i32) {
        self.provider_request
            .with_label_values(&[name, &region_id.to_string()])
            .inc();
    }

    pub fn provider_error_response(&self, name: &str, method: &str, code: u16, region_id: i32) {
        self.provider_error
            .with_label_values(&[name, method, &code.to_string(), &region_id.to_string()])
            .inc();
    }

    pub fn provider_invalid_response(&self, name: &str, cause: &str, region_id: i32) {
        self.provider_invalid
            .with_label_values(&[name, cause, &region_id.to_string()])
            .inc();
    }

    pub fn provider_ok_response(&self, name: &str, region_id: i32) {
        self.provider_ok
            .with_label_values(&[name, &region_id.to_string()])
            .inc();
    }

    pub fn provider_timeout(&self, name: &str, region_id: i32) {
        self.provider_timeout
            .with_label_values(&[name, &region_id.to_string()])
            .inc();
    }

    pub fn provider_response_time(&self, name: &str, method: &str, ms: f64) {
        self.provider_response_time
            .with_label_values(&[name, method])
            .observe(ms);
    }

    pub fn service_error(&self, cause: &str, region_id: i32) {
        self.service_error
            .with_label_values(&[cause, &region_id.to_string()])
            .inc();
    }

    pub fn filter_empty(&self, name: &str, region_id: i32) {
        self.filter_empty
            .with_label_values(&[name, &region_id.to_string()])
            .inc();
    }

    pub fn mark_cache_reload(&self) {
        self.cache_reload.set(unix_now());
    }

    pub fn mark_regions_reload(&self) {
        self.regions_reload.set(unix_now());
    }

    /// Prometheus text exposition of everything in the registry.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn provider_opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(PROVIDERS)
}

fn service_opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE).subsystem(SERVICE)
}

#[allow(clippy::cast_precision_loss)]
fn unix_now() -> f64 {
    chrono::Utc::now().timestamp() as f64
}
