//! Orchestrator - one stateless evaluation pass
//!
//! ## Stage Machine
//!
//! ```text
//! Initializing ──invalid config──→ Failed
//!      │
//!      ↓
//!   Probing → Aggregating → Notifying → Completed
//! ```
//!
//! Only configuration problems can end in `Failed`. Once probing starts the
//! invocation always completes; probe and notification failures degrade the
//! result instead of aborting it.

use chrono::Utc;
use serde::Serialize;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, info, instrument, warn};

use crate::alerts::{AlertManager, DispatchOutcome};
use crate::config::{Config, NotifyPolicy, ResolvedConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::fanout::fan_out;
use crate::probe::{HttpTransport, ProbeExecutor, Transport};
use crate::report::{Notification, RenderContext, TargetRecord, render};
use crate::summary::HealthSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initializing,
    Probing,
    Aggregating,
    Notifying,
    Completed,
    Failed,
}

impl Stage {
    fn next(self) -> Stage {
        match self {
            Stage::Initializing => Stage::Probing,
            Stage::Probing => Stage::Aggregating,
            Stage::Aggregating => Stage::Notifying,
            Stage::Notifying => Stage::Completed,
            terminal @ (Stage::Completed | Stage::Failed) => terminal,
        }
    }
}

/// Tracks the current stage of a single invocation
#[derive(Debug)]
struct Invocation {
    stage: Stage,
}

impl Invocation {
    fn new() -> Self {
        debug!("entering {:?}", Stage::Initializing);
        Self {
            stage: Stage::Initializing,
        }
    }

    fn advance(&mut self) {
        let next = self.stage.next();
        debug!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }
}

/// What the hosting environment sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    /// Every target healthy and the notification (if any) delivered
    Success,
    /// Probing completed but a target is unhealthy or the notification failed
    Degraded,
    /// Configuration was rejected before probing
    Failed,
}

impl InvocationStatus {
    pub fn status_code(&self) -> u16 {
        match self {
            InvocationStatus::Success => 200,
            InvocationStatus::Degraded => 207,
            InvocationStatus::Failed => 500,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationResult {
    pub status: InvocationStatus,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TargetRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<DispatchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub summary: Option<HealthSummary>,
    #[serde(skip)]
    pub context: Option<RenderContext>,
    #[serde(skip)]
    pub payload: Option<Notification>,
}

/// `{status_code, body}` envelope handed back to the scheduler
#[derive(Debug, Serialize)]
pub struct InvocationResponse<'a> {
    pub status_code: u16,
    pub body: &'a InvocationResult,
}

impl InvocationResult {
    fn failed(err: &ConfigError) -> Self {
        Self {
            status: InvocationStatus::Failed,
            stage: Stage::Failed,
            message: "Health check failed: invalid configuration".to_string(),
            results: Vec::new(),
            notification: None,
            error: Some(err.to_string()),
            summary: None,
            context: None,
            payload: None,
        }
    }

    pub fn response(&self) -> InvocationResponse<'_> {
        InvocationResponse {
            status_code: self.status.status_code(),
            body: self,
        }
    }
}

/// Wires the fan-out, aggregation, rendering and dispatch for one invocation
pub struct Orchestrator<T> {
    executor: ProbeExecutor<T>,
    alerts: AlertManager,
}

impl Orchestrator<HttpTransport> {
    pub fn from_config(config: &ResolvedConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            ProbeExecutor::new(HttpTransport::new()?),
            AlertManager::new(&config.notification)?,
        ))
    }
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(executor: ProbeExecutor<T>, alerts: AlertManager) -> Self {
        Self { executor, alerts }
    }

    /// Run every stage after initialization. `started` is the invocation start
    /// the deadline budget is measured from.
    #[instrument(skip_all, fields(environment = %config.environment, targets = config.targets.len()))]
    pub async fn run(&self, config: &ResolvedConfig, started: Instant) -> InvocationResult {
        let mut invocation = Invocation::new();

        invocation.advance();
        let deadline = started + config.deadline.probe_budget();
        let outcomes = fan_out(&self.executor, &config.targets, deadline).await;

        invocation.advance();
        let summary = HealthSummary::from_outcomes(outcomes);
        info!("{}", summary.headline());

        invocation.advance();
        let context = RenderContext {
            environment: config.environment.clone(),
            generated_at: Utc::now(),
        };
        let (payload, dispatch) =
            if config.notification.policy == NotifyPolicy::OnFailure && summary.is_healthy() {
                debug!("all targets healthy, notification suppressed by policy");
                (None, DispatchOutcome::Suppressed)
            } else {
                let payload = render(&summary, &context, &config.notification.channel);
                let hard_stop = started + config.deadline.ceiling;
                let dispatch = match timeout_at(hard_stop, self.alerts.dispatch(&payload)).await {
                    Ok(dispatch) => dispatch,
                    Err(_) => {
                        warn!("notification cut off at the execution ceiling");
                        DispatchOutcome::Failed {
                            reason: "deadline exceeded".to_string(),
                        }
                    }
                };
                (Some(payload), dispatch)
            };

        invocation.advance();
        let status = if summary.is_healthy() && !dispatch.is_failure() {
            InvocationStatus::Success
        } else {
            InvocationStatus::Degraded
        };

        InvocationResult {
            status,
            stage: invocation.stage,
            message: format!(
                "Health check completed: {}; {}",
                summary.headline(),
                dispatch.describe()
            ),
            results: summary.outcomes.iter().map(TargetRecord::from).collect(),
            notification: Some(dispatch),
            error: None,
            summary: Some(summary),
            context: Some(context),
            payload,
        }
    }
}

/// Validate the configuration and run one full invocation.
pub async fn invoke(config: &Config) -> InvocationResult {
    let started = Instant::now();

    let prepared = config
        .resolve()
        .and_then(|resolved| Orchestrator::from_config(&resolved).map(|o| (resolved, o)));

    match prepared {
        Ok((resolved, orchestrator)) => orchestrator.run(&resolved, started).await,
        Err(e) => reject(&e),
    }
}

/// Run an invocation on the outcome of loading the configuration.
///
/// A load error (unreadable file, malformed document, missing variable) ends
/// in the same `Failed` result as a config that does not validate.
pub async fn invoke_loaded(loaded: ConfigResult<Config>) -> InvocationResult {
    match loaded {
        Ok(config) => invoke(&config).await,
        Err(e) => reject(&e),
    }
}

fn reject(e: &ConfigError) -> InvocationResult {
    error!("invocation rejected: {e}");
    debug!("{:?} -> {:?}", Stage::Initializing, Stage::Failed);
    InvocationResult::failed(e)
}
