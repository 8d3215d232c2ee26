//! Error types for configuration loading and validation
//!
//! Only configuration problems abort an invocation. Probe and notification
//! failures are captured as data on the outcome and invocation result.

use thiserror::Error;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that reject an invocation before any network activity
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document is not valid JSON for the expected shape
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required environment variable is not set
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// An environment variable is set but unusable
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    /// No targets were configured
    #[error("no targets configured")]
    NoTargets,

    /// A target entry lacks a required field
    #[error("target #{index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    /// Target URL is empty, relative or not http(s)
    #[error("target `{name}` has an invalid url: {reason}")]
    InvalidUrl { name: String, reason: String },

    /// Timeout is zero, negative or not finite
    #[error("target `{name}` has a non-positive timeout")]
    NonPositiveTimeout { name: String },

    /// Expected status set is empty
    #[error("target `{name}` has an empty expected_status set")]
    EmptyExpectedStatus { name: String },

    /// Expected status code is outside 100..=599
    #[error("target `{name}` expects invalid status code {code}")]
    InvalidStatusCode { name: String, code: u16 },

    /// Custom header name or value cannot be sent
    #[error("target `{name}` has an invalid header `{header}`")]
    InvalidHeader { name: String, header: String },

    /// Two targets share a name
    #[error("duplicate target name `{0}`")]
    DuplicateName(String),

    /// No notification channel was configured
    #[error("no notification webhook configured")]
    MissingWebhook,

    /// Webhook URL is empty or malformed (the URL itself is never echoed)
    #[error("notification webhook url is invalid")]
    InvalidWebhook,

    /// Deadline ceiling, safety margin or notification timeout is unusable
    #[error("invalid deadline budget: {0}")]
    InvalidDeadline(String),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
