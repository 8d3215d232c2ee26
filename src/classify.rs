//! Result classification
//!
//! Maps what happened on the wire to a verdict plus a human-readable cause.
//! Pure; the probe executor and the fan-out both route through here so every
//! outcome is classified by the same rules.

use std::fmt;

use serde::Serialize;

use crate::config::TargetSpec;

/// Health classification of one probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Healthy,
    Unhealthy,
    Errored,
}

impl Verdict {
    pub fn glyph(&self) -> &'static str {
        match self {
            Verdict::Healthy => "✅",
            Verdict::Unhealthy => "🔴",
            Verdict::Errored => "⚠️",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Healthy => f.write_str("HEALTHY"),
            Verdict::Unhealthy => f.write_str("UNHEALTHY"),
            Verdict::Errored => f.write_str("ERRORED"),
        }
    }
}

/// Why no usable response was received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The target's own timeout expired
    Timeout,
    /// The invocation-wide deadline cancelled the probe
    DeadlineExceeded,
    /// DNS, refused connection, TLS handshake or unreachable network
    Connection(String),
    /// Any other failure while sending the request
    Transport(String),
}

impl ProbeFailure {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProbeFailure::Timeout;
        }
        let connect = err.is_connect();
        let chain = format!("{:#}", anyhow::Error::new(err.without_url()));
        if connect {
            ProbeFailure::Connection(chain)
        } else {
            ProbeFailure::Transport(chain)
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => f.write_str("timeout"),
            ProbeFailure::DeadlineExceeded => f.write_str("deadline exceeded"),
            ProbeFailure::Connection(cause) => write!(f, "connection failure: {cause}"),
            ProbeFailure::Transport(cause) => write!(f, "transport error: {cause}"),
        }
    }
}

/// Raw result of a single attempt before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutcome {
    Response(u16),
    Failed(ProbeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub observed_status: Option<u16>,
    pub detail: Option<String>,
}

pub fn classify(target: &TargetSpec, raw: &RawOutcome) -> Classification {
    match raw {
        RawOutcome::Failed(failure) => Classification {
            verdict: Verdict::Errored,
            observed_status: None,
            detail: Some(failure.to_string()),
        },
        RawOutcome::Response(status) if target.accepts(*status) => Classification {
            verdict: Verdict::Healthy,
            observed_status: Some(*status),
            detail: None,
        },
        RawOutcome::Response(status) => Classification {
            verdict: Verdict::Unhealthy,
            observed_status: Some(*status),
            detail: Some(status_mismatch(*status, target)),
        },
    }
}

fn status_mismatch(observed: u16, target: &TargetSpec) -> String {
    let expected = target
        .expected_status
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>();
    match expected.as_slice() {
        [single] => format!("status {observed}, expected {single}"),
        _ => format!("status {observed}, expected one of {}", expected.join(", ")),
    }
}
