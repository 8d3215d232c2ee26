use serde::Serialize;

use crate::classify::Verdict;
use crate::report::{Report, TargetRecord};

/// Slack rejects messages with more than 50 blocks
const MAX_BLOCKS: usize = 50;

/// Longest text Slack accepts in a section block
const MAX_SECTION_CHARS: usize = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackMessage {
    /// Fallback shown in notifications and clients without block support
    pub text: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: TextObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl Block {
    fn section(text: String) -> Self {
        Self {
            kind: "section",
            text: TextObject {
                kind: "mrkdwn",
                text,
            },
        }
    }
}

impl SlackMessage {
    pub fn from_report(report: &Report) -> Self {
        let header = Block::section(format!(
            "{} - Environment: {}\n{}\nGenerated: {}",
            bold_title(report),
            report.environment,
            report.headline(),
            report.generated_at
        ));

        let mut blocks = vec![header];
        let room = MAX_BLOCKS - 1;
        if report.targets.len() <= room {
            blocks.extend(report.targets.iter().map(target_block));
        } else {
            // One line per target, packed into sections with failures first
            let mut sections = pack_lines(report.failures_first().map(TargetRecord::line));
            if sections.len() > room {
                let dropped: usize = sections.drain(room - 1..).map(|(_, lines)| lines).sum();
                sections.push((format!("_…and {dropped} more targets_"), 0));
            }
            blocks.extend(sections.into_iter().map(|(text, _)| Block::section(text)));
        }

        Self {
            text: format!("{} - {}", report.title(), report.headline()),
            blocks,
        }
    }
}

fn bold_title(report: &Report) -> String {
    // "🚨 Service Health Alert" -> "🚨 *Service Health Alert*"
    match report.title().split_once(' ') {
        Some((glyph, words)) => format!("{glyph} *{words}*"),
        None => report.title().to_string(),
    }
}

/// Join lines into section texts no longer than [`MAX_SECTION_CHARS`],
/// returning each text with the number of lines it holds.
fn pack_lines(lines: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut sections: Vec<(String, usize)> = Vec::new();
    for line in lines {
        match sections.last_mut() {
            Some((text, count))
                if text.chars().count() + 1 + line.chars().count() <= MAX_SECTION_CHARS =>
            {
                text.push('\n');
                text.push_str(&line);
                *count += 1;
            }
            _ => sections.push((line, 1)),
        }
    }
    sections
}

fn target_block(record: &TargetRecord) -> Block {
    let mut text = format!(
        "{} *{}* ({})\nStatus: {}\nStatus Code: {}\nLatency: {} ms",
        record.verdict.glyph(),
        record.name,
        record.kind,
        record.verdict,
        record.status_text(),
        record.latency_ms
    );
    if record.verdict != Verdict::Healthy {
        text.push_str("\nError: ");
        text.push_str(record.detail_text());
    }
    Block::section(text)
}
