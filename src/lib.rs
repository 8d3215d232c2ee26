//! Concurrent probe-and-notify pipeline
//!
//! One invocation probes every configured target concurrently, classifies
//! each result, aggregates them in target order and posts a single
//! consolidated notification to a chat webhook.
//!
//! ```text
//! Config → resolve → fan_out (N × ProbeExecutor) → HealthSummary → render → AlertManager
//! ```

pub mod alerts;
pub mod classify;
pub mod config;
pub mod discord;
pub mod error;
pub mod fanout;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod slack;
pub mod summary;
pub mod util;

pub use classify::Verdict;
pub use config::{Config, ResolvedConfig, TargetSpec};
pub use error::ConfigError;
pub use pipeline::{InvocationResult, InvocationStatus, Orchestrator, Stage, invoke, invoke_loaded};
pub use probe::ProbeOutcome;
pub use summary::{HealthSummary, OverallHealth};
