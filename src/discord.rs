use serde::Serialize;

use crate::classify::Verdict;
use crate::report::{Report, TargetRecord};
use crate::summary::OverallHealth;

/// Discord allows at most 25 fields per embed
const MAX_FIELDS: usize = 25;

const RED: u32 = 15158332;
const GREEN: u32 = 3066993;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Default)]
pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

fn target_field(record: &TargetRecord) -> EmbedField {
    let mut value = format!(
        "{} | {} ms | status {}",
        record.verdict,
        record.latency_ms,
        record.status_text()
    );
    if record.verdict != Verdict::Healthy {
        value.push_str(&format!("\n`{}`", record.detail_text()));
    }

    EmbedField {
        name: format!("{} {} ({})", record.verdict.glyph(), record.name, record.kind),
        value,
        inline: false,
    }
}

/// Summarizes records that did not get a field of their own; failing ones
/// are still named.
fn overflow_field(rest: &[&TargetRecord]) -> EmbedField {
    let mut value = format!("and {} more targets", rest.len());
    let failing: Vec<&str> = rest
        .iter()
        .filter(|record| record.verdict != Verdict::Healthy)
        .map(|record| record.name.as_str())
        .collect();
    if !failing.is_empty() {
        value.push_str(&format!("\nnot healthy: {}", failing.join(", ")));
    }

    EmbedField {
        name: "…".to_string(),
        value,
        inline: false,
    }
}

pub fn build_report_embed(report: &Report) -> Embed {
    let color = match report.overall {
        OverallHealth::Healthy => GREEN,
        OverallHealth::Degraded => RED,
    };

    let fields: Vec<EmbedField> = if report.targets.len() <= MAX_FIELDS {
        report.targets.iter().map(target_field).collect()
    } else {
        let mut shown: Vec<&TargetRecord> = report.failures_first().collect();
        let rest = shown.split_off(MAX_FIELDS - 1);
        let mut fields: Vec<EmbedField> = shown.into_iter().map(target_field).collect();
        fields.push(overflow_field(&rest));
        fields
    };

    Embed {
        title: Some(report.title().to_string()),
        description: Some(report.headline()),
        color: Some(color),
        fields,
        footer: Some(EmbedFooter {
            text: format!("Environment: {}", report.environment),
        }),
        timestamp: Some(report.generated_at.clone()),
    }
}

/// One message per invocation; the user is only pinged when something is wrong.
pub fn build_report_message(report: &Report, user_id: Option<&str>) -> Message {
    let mut message_builder = MessageBuilder::new().add_embed(build_report_embed(report));
    if let (OverallHealth::Degraded, Some(user_id)) = (report.overall, user_id) {
        message_builder = message_builder.content(format!(
            "🚨 ({} ~ {}) <@{user_id}>",
            report.environment,
            report.headline()
        ));
    }
    message_builder.build()
}
