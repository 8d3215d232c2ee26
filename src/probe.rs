//! Probe executor - one HTTP check per target
//!
//! The executor owns the per-target timeout and latency measurement and
//! converts every failure mode into a [`ProbeOutcome`]. The network side sits
//! behind the [`Transport`] trait so the timing and classification rules can be
//! exercised without sockets.
//!
//! ```text
//! start clock → Transport::fetch_status (bounded by target.timeout) → classify → ProbeOutcome
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{Instant, timeout};
use tracing::{debug, instrument, warn};

use crate::classify::{ProbeFailure, RawOutcome, Verdict, classify};
use crate::config::TargetSpec;
use crate::error::{ConfigError, ConfigResult};

/// Result of probing one target. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub target: Arc<TargetSpec>,
    pub verdict: Verdict,
    /// Present only when a response was received
    pub observed_status: Option<u16>,
    pub latency: Duration,
    pub detail: Option<String>,
    /// When the attempt started
    pub timestamp: DateTime<Utc>,
}

impl ProbeOutcome {
    pub fn from_raw(
        target: Arc<TargetSpec>,
        raw: &RawOutcome,
        latency: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let classification = classify(&target, raw);
        Self {
            target,
            verdict: classification.verdict,
            observed_status: classification.observed_status,
            latency,
            detail: classification.detail,
            timestamp,
        }
    }

    /// Outcome for a probe cancelled by the invocation deadline
    pub fn deadline_exceeded(
        target: Arc<TargetSpec>,
        latency: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::from_raw(
            target,
            &RawOutcome::Failed(ProbeFailure::DeadlineExceeded),
            latency,
            timestamp,
        )
    }

    pub fn is_healthy(&self) -> bool {
        self.verdict == Verdict::Healthy
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis().try_into().unwrap_or(u64::MAX)
    }
}

/// Network side of a probe: send one request, report the status code
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_status(&self, target: &TargetSpec) -> Result<u16, ProbeFailure>;
}

/// reqwest-backed transport shared by all probes of an invocation
///
/// Redirects are followed unless the target expects a 3xx status, in which
/// case the first response is classified as is.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    no_redirect: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> ConfigResult<Self> {
        let builder = || {
            reqwest::Client::builder().user_agent(concat!("health-sweep/", env!("CARGO_PKG_VERSION")))
        };
        let client = builder().build().map_err(ConfigError::HttpClient)?;
        let no_redirect = builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self {
            client,
            no_redirect,
        })
    }

    fn client_for(&self, target: &TargetSpec) -> &reqwest::Client {
        if target.expects_redirect() {
            &self.no_redirect
        } else {
            &self.client
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_status(&self, target: &TargetSpec) -> Result<u16, ProbeFailure> {
        // The body is never read; only the status line matters.
        let response = self
            .client_for(target)
            .request(target.method.into(), target.url.clone())
            .headers(target.headers.clone())
            .timeout(target.timeout)
            .send()
            .await
            .map_err(ProbeFailure::from_reqwest)?;

        Ok(response.status().as_u16())
    }
}

/// Runs exactly one attempt per target and never fails past its boundary
#[derive(Debug, Clone)]
pub struct ProbeExecutor<T> {
    transport: T,
}

impl<T: Transport> ProbeExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[instrument(skip_all, fields(service = %target.name))]
    pub async fn probe(&self, target: Arc<TargetSpec>) -> ProbeOutcome {
        let timestamp = Utc::now();
        let start = Instant::now();

        let raw = match timeout(target.timeout, self.transport.fetch_status(&target)).await {
            Ok(Ok(status)) => RawOutcome::Response(status),
            Ok(Err(failure)) => RawOutcome::Failed(failure),
            Err(_) => RawOutcome::Failed(ProbeFailure::Timeout),
        };

        let mut latency = start.elapsed();
        if raw == RawOutcome::Failed(ProbeFailure::Timeout) {
            latency = latency.min(target.timeout);
        }

        let outcome = ProbeOutcome::from_raw(target, &raw, latency, timestamp);
        if outcome.is_healthy() {
            debug!(
                "healthy in {}ms (status {:?})",
                outcome.latency_ms(),
                outcome.observed_status
            );
        } else {
            warn!(
                "{} after {}ms: {}",
                outcome.verdict,
                outcome.latency_ms(),
                outcome.detail.as_deref().unwrap_or("n/a")
            );
        }
        outcome
    }
}
