//! Notification dispatcher
//!
//! Delivers the rendered notification with a single attempt under its own
//! timeout. Failures are returned as a [`DispatchOutcome`] and never retried.
//! The webhook URL is a secret and never appears in logs or outcomes.

use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument, trace};

use crate::config::{ResolvedNotification, Secret};
use crate::error::{ConfigError, ConfigResult};
use crate::report::Notification;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Webhook answered with a 2xx status
    Delivered { status: u16 },
    /// Webhook answered with a non-2xx status
    Rejected { status: u16 },
    /// No response: network error or timeout
    Failed { reason: String },
    /// Policy decided not to notify
    Suppressed,
}

impl DispatchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Rejected { .. } | DispatchOutcome::Failed { .. }
        )
    }

    pub fn describe(&self) -> String {
        match self {
            DispatchOutcome::Delivered { .. } => "notification delivered".to_string(),
            DispatchOutcome::Rejected { status } => {
                format!("notification rejected with status {status}")
            }
            DispatchOutcome::Failed { reason } => format!("notification failed: {reason}"),
            DispatchOutcome::Suppressed => "notification suppressed".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AlertManager {
    client: Client,
    url: Secret,
}

impl AlertManager {
    pub fn new(notification: &ResolvedNotification) -> ConfigResult<Self> {
        let client = Client::builder()
            .timeout(notification.timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            url: notification.channel.url().clone(),
        })
    }

    #[instrument(skip_all)]
    pub async fn dispatch(&self, notification: &Notification) -> DispatchOutcome {
        match self
            .client
            .post(self.url.expose())
            .json(notification)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    info!("Successfully sent notification");
                    DispatchOutcome::Delivered {
                        status: status.as_u16(),
                    }
                } else {
                    error!("Notification failed with status: {}", status);
                    if let Ok(error_text) = response.text().await {
                        trace!("webhook error response: {}", error_text);
                    }
                    DispatchOutcome::Rejected {
                        status: status.as_u16(),
                    }
                }
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timeout".to_string()
                } else {
                    format!("{:#}", anyhow::Error::new(e.without_url()))
                };
                error!("Failed to send notification: {}", reason);
                DispatchOutcome::Failed { reason }
            }
        }
    }
}
