use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::error::{ConfigError, ConfigResult};
use crate::util::{self, positive_secs};

/// Opaque string that is passed through unmodified but never printed
#[derive(Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Frontend,
    Backend,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Frontend => f.write_str("frontend"),
            ServiceKind::Backend => f.write_str("backend"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// Acceptable status codes as written in the configuration: a single code or a list
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum ExpectedStatus {
    Single(u16),
    Many(Vec<u16>),
}

impl ExpectedStatus {
    pub fn into_set(self) -> BTreeSet<u16> {
        match self {
            ExpectedStatus::Single(code) => BTreeSet::from([code]),
            ExpectedStatus::Many(codes) => codes.into_iter().collect(),
        }
    }
}

/// One target entry as it appears in the input configuration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TargetConfig {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(alias = "type")]
    pub kind: Option<ServiceKind>,
    /// Timeout in seconds
    pub timeout: Option<f64>,
    pub expected_status: Option<ExpectedStatus>,
    #[serde(default, alias = "headers")]
    pub custom_headers: Option<BTreeMap<String, Secret>>,
    #[serde(default)]
    pub method: HttpMethod,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Slack(Slack),
    Discord(Discord),
    Webhook(Webhook),
}

impl Channel {
    pub fn url(&self) -> &Secret {
        match self {
            Channel::Slack(slack) => &slack.url,
            Channel::Discord(discord) => &discord.url,
            Channel::Webhook(webhook) => &webhook.url,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Slack {
    pub url: Secret,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Discord {
    pub url: Secret,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Webhook {
    pub url: Secret,
}

/// Whether a fully healthy sweep still produces a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    #[default]
    Always,
    OnFailure,
}

impl FromStr for NotifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(NotifyPolicy::Always),
            "on_failure" | "on-failure" => Ok(NotifyPolicy::OnFailure),
            other => Err(format!("unknown notify policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NotificationConfig {
    pub channel: Channel,
    #[serde(default)]
    pub policy: NotifyPolicy,
    /// Dispatch timeout in seconds
    #[serde(default = "crate::util::get_default_notify_timeout")]
    pub timeout: f64,
}

/// Wall-clock budget handed down by the invoking scheduler
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DeadlineConfig {
    /// Execution ceiling in seconds
    #[serde(default = "crate::util::get_default_ceiling")]
    pub ceiling: f64,
    /// Seconds reserved after probing for aggregation and notification
    #[serde(default = "crate::util::get_default_safety_margin")]
    pub safety_margin: f64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            ceiling: util::get_default_ceiling(),
            safety_margin: util::get_default_safety_margin(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    pub notification: Option<NotificationConfig>,
    #[serde(default)]
    pub deadline: DeadlineConfig,
    #[serde(default = "crate::util::get_default_environment")]
    pub environment: String,
}

/// Validated description of one service to check
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub name: String,
    pub url: Url,
    pub kind: ServiceKind,
    pub timeout: Duration,
    pub expected_status: BTreeSet<u16>,
    pub headers: HeaderMap,
    pub method: HttpMethod,
}

impl TargetSpec {
    /// Create a target with the default timeout, expected status and method
    pub fn new(name: impl Into<String>, url: Url, kind: ServiceKind) -> Self {
        Self {
            name: name.into(),
            url,
            kind,
            timeout: Duration::from_secs_f64(util::get_default_target_timeout()),
            expected_status: BTreeSet::from([util::get_default_expected_status()]),
            headers: HeaderMap::new(),
            method: HttpMethod::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_expected_status(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.expected_status = codes.into_iter().collect();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.expected_status.contains(&status)
    }

    /// A 3xx code in the expected set means the redirect itself is the answer
    pub fn expects_redirect(&self) -> bool {
        self.expected_status.range(300..400).next().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub ceiling: Duration,
    pub safety_margin: Duration,
}

impl Deadline {
    /// Time available to the fan-out, measured from invocation start
    pub fn probe_budget(&self) -> Duration {
        self.ceiling.saturating_sub(self.safety_margin)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedNotification {
    pub channel: Channel,
    pub policy: NotifyPolicy,
    pub timeout: Duration,
}

/// Immutable configuration for one invocation, built once and shared by reference
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub targets: Vec<Arc<TargetSpec>>,
    pub notification: ResolvedNotification,
    pub deadline: Deadline,
    pub environment: String,
}

impl TargetConfig {
    fn resolve(&self, index: usize) -> ConfigResult<TargetSpec> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingField {
                index,
                field: "name",
            })?
            .to_string();

        let raw_url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingField { index, field: "url" })?;

        let url = Url::parse(raw_url).map_err(|e| ConfigError::InvalidUrl {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                name,
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }

        let kind = self.kind.ok_or(ConfigError::MissingField {
            index,
            field: "kind",
        })?;

        let timeout = positive_secs(self.timeout.unwrap_or_else(util::get_default_target_timeout))
            .ok_or_else(|| ConfigError::NonPositiveTimeout { name: name.clone() })?;

        let expected_status = self
            .expected_status
            .clone()
            .map(ExpectedStatus::into_set)
            .unwrap_or_else(|| BTreeSet::from([util::get_default_expected_status()]));
        if expected_status.is_empty() {
            return Err(ConfigError::EmptyExpectedStatus { name });
        }
        if let Some(&code) = expected_status.iter().find(|code| !(100..=599).contains(*code)) {
            return Err(ConfigError::InvalidStatusCode { name, code });
        }

        let mut headers = HeaderMap::new();
        for (header, value) in self.custom_headers.iter().flatten() {
            let invalid = || ConfigError::InvalidHeader {
                name: name.clone(),
                header: header.clone(),
            };
            let header_name = HeaderName::from_bytes(header.as_bytes()).map_err(|_| invalid())?;
            let mut header_value = HeaderValue::from_str(value.expose()).map_err(|_| invalid())?;
            header_value.set_sensitive(true);
            headers.insert(header_name, header_value);
        }

        Ok(TargetSpec {
            name,
            url,
            kind,
            timeout,
            expected_status,
            headers,
            method: self.method,
        })
    }
}

impl NotificationConfig {
    fn resolve(&self) -> ConfigResult<ResolvedNotification> {
        let url = Url::parse(self.channel.url().expose().trim())
            .map_err(|_| ConfigError::InvalidWebhook)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidWebhook);
        }

        let timeout = positive_secs(self.timeout).ok_or_else(|| {
            ConfigError::InvalidDeadline("notification timeout must be positive".to_string())
        })?;

        Ok(ResolvedNotification {
            channel: self.channel.clone(),
            policy: self.policy,
            timeout,
        })
    }
}

impl DeadlineConfig {
    fn resolve(&self) -> ConfigResult<Deadline> {
        let ceiling = positive_secs(self.ceiling).ok_or_else(|| {
            ConfigError::InvalidDeadline("execution ceiling must be positive".to_string())
        })?;
        let safety_margin = positive_secs(self.safety_margin).ok_or_else(|| {
            ConfigError::InvalidDeadline("safety margin must be positive".to_string())
        })?;
        if safety_margin >= ceiling {
            return Err(ConfigError::InvalidDeadline(format!(
                "safety margin of {}s leaves no time for probing within a {}s ceiling",
                self.safety_margin, self.ceiling
            )));
        }

        Ok(Deadline {
            ceiling,
            safety_margin,
        })
    }
}

impl Config {
    /// Validate every entry and normalize it into the shape the pipeline consumes.
    ///
    /// Fails on the first problem found; nothing is probed for an invalid config.
    pub fn resolve(&self) -> ConfigResult<ResolvedConfig> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let mut seen = HashSet::with_capacity(self.targets.len());
        let mut targets = Vec::with_capacity(self.targets.len());
        for (index, target) in self.targets.iter().enumerate() {
            let spec = target.resolve(index)?;
            if !seen.insert(spec.name.clone()) {
                return Err(ConfigError::DuplicateName(spec.name));
            }
            targets.push(Arc::new(spec));
        }

        let notification = self
            .notification
            .as_ref()
            .ok_or(ConfigError::MissingWebhook)?
            .resolve()?;

        Ok(ResolvedConfig {
            targets,
            notification,
            deadline: self.deadline.resolve()?,
            environment: self.environment.clone(),
        })
    }

    /// Load configuration from the process environment
    pub fn from_env() -> ConfigResult<Config> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// `SERVICES_CONFIG` holds the JSON target list and defaults to an empty
    /// list; `SLACK_WEBHOOK_URL` is required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Config> {
        let targets = match lookup(util::SERVICES_CONFIG) {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        let url = lookup(util::SLACK_WEBHOOK_URL)
            .ok_or(ConfigError::MissingEnv(util::SLACK_WEBHOOK_URL))?;

        let policy = match lookup(util::NOTIFY_POLICY) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::InvalidEnv {
                var: util::NOTIFY_POLICY,
                reason,
            })?,
            None => NotifyPolicy::default(),
        };

        let secs = |var: &'static str, default: fn() -> f64| -> ConfigResult<f64> {
            match lookup(var) {
                Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseFloatError| {
                    ConfigError::InvalidEnv {
                        var,
                        reason: e.to_string(),
                    }
                }),
                None => Ok(default()),
            }
        };

        let config = Config {
            targets,
            notification: Some(NotificationConfig {
                channel: Channel::Slack(Slack {
                    url: Secret::new(url),
                }),
                policy,
                timeout: util::get_default_notify_timeout(),
            }),
            deadline: DeadlineConfig {
                ceiling: secs(util::INVOCATION_DEADLINE_SECS, util::get_default_ceiling)?,
                safety_margin: secs(
                    util::DEADLINE_SAFETY_MARGIN_SECS,
                    util::get_default_safety_margin,
                )?,
            },
            environment: lookup(util::ENVIRONMENT).unwrap_or_else(util::get_default_environment),
        };
        trace!("loaded config from environment: {config:?}");
        Ok(config)
    }
}

pub fn read_config_file(path: &str) -> ConfigResult<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(ConfigError::from)
        .inspect(|config| trace!("loaded config: {config:?}"))
}
