//! Shared HTTP plumbing for provider adapters.
//!
//! One tuned `reqwest::Client` serves every adapter; each call is bounded by
//! the request deadline and classified into the provider counters as it
//! completes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use fareline_core::Deadline;
use fareline_metrics::Collector;

use crate::ProviderError;

const USER_AGENT: &str = "FarelineBackend/2.0";
const IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(5);

/// Telemetry identity of one adapter call: which provider, for which region,
/// and how much of the request budget is left.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub api_name: &'a str,
    pub region_id: i32,
    pub deadline: Deadline,
}

/// The shared upstream HTTP client with metrics recording.
#[derive(Clone)]
pub struct ProviderHttp {
    client: Client,
    collector: Arc<Collector>,
}

impl ProviderHttp {
    /// Builds the shared client with the tuned connection pool.
    ///
    /// Provider endpoints sit behind assorted reverse proxies with broken
    /// certificate chains; certificate verification stays off for them.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] when the client cannot be constructed.
    pub fn new(collector: Arc<Collector>, max_idle_per_host: usize) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .pool_idle_timeout(IDLE_CONN_TIMEOUT)
            .pool_max_idle_per_host(max_idle_per_host)
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, collector })
    }

    /// Wraps an existing client; used by tests to skip the pool tuning.
    #[must_use]
    pub fn from_client(client: Client, collector: Arc<Collector>) -> Self {
        Self { client, collector }
    }

    /// The underlying client, shared with the non-provider upstreams so the
    /// whole process runs one connection pool.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET with query params, JSON-decoded response.
    ///
    /// # Errors
    ///
    /// See [`ProviderHttp::execute`] classification.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext<'_>,
        url: &str,
        headers: &HashMap<String, String>,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = parse_url(url)?;
        let request = self.client.get(url.clone()).query(params);
        self.execute(ctx, url, add_headers(request, headers)).await
    }

    /// POST with a JSON body, JSON-decoded response.
    ///
    /// # Errors
    ///
    /// See [`ProviderHttp::execute`] classification.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &CallContext<'_>,
        url: &str,
        headers: &HashMap<String, String>,
        body: &B,
    ) -> Result<T, ProviderError> {
        let url = parse_url(url)?;
        let request = self.client.post(url.clone()).json(body);
        self.execute(ctx, url, add_headers(request, headers)).await
    }

    /// Sends the request under the remaining deadline and classifies the
    /// outcome: deadline cuts feed the timeout counter, non-2xx the error
    /// counter, undecodable bodies the invalid counter; successes record the
    /// per-method response time.
    async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &CallContext<'_>,
        url: Url,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let method_label = url.path().to_string();
        self.collector.provider_request(ctx.api_name, ctx.region_id);

        if ctx.deadline.is_elapsed() {
            self.collector.provider_timeout(ctx.api_name, ctx.region_id);
            return Err(ProviderError::DeadlineExceeded);
        }

        let started = Instant::now();
        let response = request.timeout(ctx.deadline.remaining()).send().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                self.collector.provider_timeout(ctx.api_name, ctx.region_id);
                return Err(ProviderError::DeadlineExceeded);
            }
            Err(e) => return Err(ProviderError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            self.collector.provider_error_response(
                ctx.api_name,
                &method_label,
                status.as_u16(),
                ctx.region_id,
            );
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.collector.provider_invalid_response(
                    ctx.api_name,
                    &format!("read_{method_label}"),
                    ctx.region_id,
                );
                return Err(ProviderError::Http(e));
            }
        };

        match serde_json::from_str::<T>(&body) {
            Ok(decoded) => {
                self.collector
                    .provider_response_time(ctx.api_name, &method_label, elapsed_ms);
                Ok(decoded)
            }
            Err(e) => {
                self.collector.provider_invalid_response(
                    ctx.api_name,
                    &format!("parse_{method_label}"),
                    ctx.region_id,
                );
                Err(ProviderError::Deserialize {
                    context: format!("{} {url}", ctx.api_name),
                    source: e,
                })
            }
        }
    }
}

fn parse_url(url: &str) -> Result<Url, ProviderError> {
    Url::parse(url).map_err(|e| ProviderError::BadUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn add_headers(
    mut request: reqwest::RequestBuilder,
    headers: &HashMap<String, String>,
) -> reqwest::RequestBuilder {
    for (key, value) in headers {
        request = request.header(key, value);
    }
    request
}
