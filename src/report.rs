//! Notification rendering
//!
//! [`Report`] is the channel-independent payload: overall status, generation
//! time, environment, counts and one record per target in target order. Each
//! webhook flavour wraps the same report content in its own body shape.
//! Rendering is pure: identical summary and context produce identical bytes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::classify::Verdict;
use crate::config::{Channel, ServiceKind};
use crate::discord;
use crate::probe::ProbeOutcome;
use crate::slack::SlackMessage;
use crate::summary::{HealthSummary, OverallHealth};

/// Placeholder for absent optional values
pub const PLACEHOLDER: &str = "n/a";

/// Inputs to rendering that do not come from the probes themselves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub environment: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRecord {
    pub name: String,
    pub kind: ServiceKind,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_status: Option<u16>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&ProbeOutcome> for TargetRecord {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            name: outcome.target.name.clone(),
            kind: outcome.target.kind,
            verdict: outcome.verdict,
            observed_status: outcome.observed_status,
            latency_ms: outcome.latency_ms(),
            detail: outcome.detail.clone(),
        }
    }
}

impl TargetRecord {
    pub fn status_text(&self) -> String {
        self.observed_status
            .map_or_else(|| PLACEHOLDER.to_string(), |status| status.to_string())
    }

    pub fn detail_text(&self) -> &str {
        self.detail.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// One line per target: glyph, name, kind, verdict, latency, status and,
    /// for failures, the cause.
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} *{}* ({}) {} | {} ms | status {}",
            self.verdict.glyph(),
            self.name,
            self.kind,
            self.verdict,
            self.latency_ms,
            self.status_text()
        );
        if self.verdict != Verdict::Healthy {
            line.push_str(" | ");
            line.push_str(self.detail_text());
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub overall: OverallHealth,
    pub environment: String,
    pub generated_at: String,
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub errored: usize,
    pub targets: Vec<TargetRecord>,
}

impl Report {
    pub fn new(summary: &HealthSummary, context: &RenderContext) -> Self {
        Self {
            overall: summary.overall,
            environment: context.environment.clone(),
            generated_at: context
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            total: summary.total(),
            healthy: summary.healthy_count,
            unhealthy: summary.unhealthy_count,
            errored: summary.errored_count,
            targets: summary.outcomes.iter().map(TargetRecord::from).collect(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.overall {
            OverallHealth::Healthy => "✅ Service Health OK",
            OverallHealth::Degraded => "🚨 Service Health Alert",
        }
    }

    pub fn headline(&self) -> String {
        format!(
            "{}/{} targets healthy ({} unhealthy, {} errored)",
            self.healthy, self.total, self.unhealthy, self.errored
        )
    }

    /// Records that are not healthy, in target order
    pub fn failures(&self) -> impl Iterator<Item = &TargetRecord> {
        self.targets.iter().filter(|t| t.verdict != Verdict::Healthy)
    }

    /// Failures first, then healthy records, each group in target order.
    /// Channels that must shorten the list drop from the healthy tail.
    pub fn failures_first(&self) -> impl Iterator<Item = &TargetRecord> {
        self.failures()
            .chain(self.targets.iter().filter(|t| t.verdict == Verdict::Healthy))
    }

    /// Plain-text rendering shared by the generic webhook and fallbacks
    pub fn text(&self) -> String {
        let mut lines = vec![
            format!("{} - Environment: {}", self.title(), self.environment),
            self.headline(),
        ];
        lines.extend(self.targets.iter().map(TargetRecord::line));
        lines.join("\n")
    }
}

/// Body for the generic JSON webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub message: String,
    #[serde(flatten)]
    pub report: Report,
}

/// Fully rendered, channel-specific webhook body
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Notification {
    Slack(SlackMessage),
    Discord(discord::Message),
    Webhook(WebhookMessage),
}

impl Notification {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Render a summary into the single message for the configured channel.
pub fn render(summary: &HealthSummary, context: &RenderContext, channel: &Channel) -> Notification {
    let report = Report::new(summary, context);
    match channel {
        Channel::Slack(_) => Notification::Slack(SlackMessage::from_report(&report)),
        Channel::Discord(config) => Notification::Discord(discord::build_report_message(
            &report,
            config.user_id.as_deref(),
        )),
        Channel::Webhook(_) => Notification::Webhook(WebhookMessage {
            message: report.text(),
            report,
        }),
    }
}
