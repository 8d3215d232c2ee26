use std::time::Duration;

pub const SERVICES_CONFIG: &str = "SERVICES_CONFIG";

pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

pub const ENVIRONMENT: &str = "ENVIRONMENT";

pub const INVOCATION_DEADLINE_SECS: &str = "INVOCATION_DEADLINE_SECS";

pub const DEADLINE_SAFETY_MARGIN_SECS: &str = "DEADLINE_SAFETY_MARGIN_SECS";

pub const NOTIFY_POLICY: &str = "NOTIFY_POLICY";

const DEFAULT_TARGET_TIMEOUT_SECS: f64 = 30.0;

const DEFAULT_EXPECTED_STATUS: u16 = 200;

const DEFAULT_CEILING_SECS: f64 = 300.0;

const DEFAULT_SAFETY_MARGIN_SECS: f64 = 15.0;

const DEFAULT_NOTIFY_TIMEOUT_SECS: f64 = 10.0;

const DEFAULT_ENVIRONMENT: &str = "unknown";

pub fn get_default_target_timeout() -> f64 {
    DEFAULT_TARGET_TIMEOUT_SECS
}

pub fn get_default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS
}

pub fn get_default_ceiling() -> f64 {
    DEFAULT_CEILING_SECS
}

pub fn get_default_safety_margin() -> f64 {
    DEFAULT_SAFETY_MARGIN_SECS
}

pub fn get_default_notify_timeout() -> f64 {
    DEFAULT_NOTIFY_TIMEOUT_SECS
}

pub fn get_default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

/// Convert a configured number of seconds into a duration.
///
/// Returns `None` for zero, negative, NaN, infinite or overflowing values.
pub fn positive_secs(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|duration| !duration.is_zero())
}
