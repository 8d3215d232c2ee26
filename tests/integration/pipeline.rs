//! End-to-end tests for a full invocation
//!
//! These tests verify that:
//! - A healthy sweep produces a Healthy summary and still notifies
//! - Mixed failures degrade the summary with correct counts
//! - Outcome order follows configuration order, not completion order
//! - Each channel flavour receives exactly one message
//! - Large sweeps never leave a failing target out of the message

use std::time::Duration;

use health_sweep::alerts::DispatchOutcome;
use health_sweep::{InvocationStatus, OverallHealth, Stage, Verdict, invoke};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::MockServer;

use crate::helpers::*;

#[tokio::test]
async fn test_single_healthy_target() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 200, Duration::from_millis(50)).await;
    mount_hook(&hook, 200).await;

    let config = webhook_config(
        vec![target_with(
            "api",
            format!("{}/health", targets.uri()),
            json!({ "expected_status": 200 }),
        )],
        &hook,
    );
    let result = invoke(&config).await;

    assert_eq!(result.status, InvocationStatus::Success);
    assert_eq!(result.stage, Stage::Completed);
    let summary = result.summary.as_ref().unwrap();
    assert_eq!(summary.overall, OverallHealth::Healthy);
    assert_eq!(summary.outcomes.len(), 1);
    assert_eq!(summary.outcomes[0].verdict, Verdict::Healthy);
    assert_eq!(summary.outcomes[0].observed_status, Some(200));
    assert_eq!(
        result.notification,
        Some(DispatchOutcome::Delivered { status: 200 })
    );

    let body = hook_body(&hook).await;
    assert_eq!(body["overall"], "healthy");
    assert_eq!(body["environment"], "test");
    assert_eq!(body["targets"][0]["name"], "api");
    assert_eq!(body["targets"][0]["verdict"], "healthy");
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn test_unhealthy_and_timed_out_targets() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/broken", 500, Duration::ZERO).await;
    mount_target(&targets, "/slow", 200, Duration::from_secs(3)).await;
    mount_hook(&hook, 200).await;

    let config = webhook_config(
        vec![
            target("broken", format!("{}/broken", targets.uri())),
            target_with(
                "slow",
                format!("{}/slow", targets.uri()),
                json!({ "timeout": 0.5 }),
            ),
        ],
        &hook,
    );
    let result = invoke(&config).await;

    assert_eq!(result.status, InvocationStatus::Degraded);
    assert_eq!(result.stage, Stage::Completed);
    let summary = result.summary.as_ref().unwrap();
    assert_eq!(summary.overall, OverallHealth::Degraded);
    assert_eq!(summary.unhealthy_count, 1);
    assert_eq!(summary.errored_count, 1);
    assert_eq!(result.results[0].name, "broken");
    assert_eq!(result.results[0].observed_status, Some(500));
    assert_eq!(result.results[1].name, "slow");
    assert_eq!(result.results[1].detail.as_deref(), Some("timeout"));

    let body = hook_body(&hook).await;
    assert_eq!(body["overall"], "degraded");
    assert_eq!(body["unhealthy"], 1);
    assert_eq!(body["errored"], 1);
    assert!(body["message"].as_str().unwrap().contains("| timeout"));
}

#[tokio::test]
async fn test_empty_target_list_is_configuration_error() {
    let hook = MockServer::start().await;

    let result = invoke(&webhook_config(vec![], &hook)).await;

    assert_eq!(result.status, InvocationStatus::Failed);
    assert_eq!(result.stage, Stage::Failed);
    assert!(result.summary.is_none());
    assert!(hook.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_target_rejects_whole_invocation() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 200, Duration::ZERO).await;

    let config = webhook_config(
        vec![
            target("good", format!("{}/health", targets.uri())),
            target_with(
                "bad",
                format!("{}/health", targets.uri()),
                json!({ "timeout": 0 }),
            ),
        ],
        &hook,
    );
    let result = invoke(&config).await;

    assert_eq!(result.status, InvocationStatus::Failed);
    assert!(result.error.as_deref().unwrap().contains("`bad`"));
    assert!(targets.received_requests().await.unwrap().is_empty());
    assert!(hook.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_order_follows_configuration() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/a", 200, Duration::from_millis(400)).await;
    mount_target(&targets, "/b", 503, Duration::from_millis(200)).await;
    mount_target(&targets, "/c", 200, Duration::ZERO).await;
    mount_hook(&hook, 204).await;

    let config = webhook_config(
        vec![
            target("a", format!("{}/a", targets.uri())),
            target("b", format!("{}/b", targets.uri())),
            target("c", format!("{}/c", targets.uri())),
        ],
        &hook,
    );
    let result = invoke(&config).await;

    let names: Vec<_> = result.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let body = hook_body(&hook).await;
    let hook_names: Vec<_> = body["targets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(hook_names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_slack_channel_receives_blocks() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 503, Duration::ZERO).await;
    mount_hook(&hook, 200).await;

    let config = config_with_channel(
        vec![target("api", format!("{}/health", targets.uri()))],
        json!({ "slack": { "url": format!("{}/hook", hook.uri()) } }),
    );
    let result = invoke(&config).await;
    assert_eq!(result.status, InvocationStatus::Degraded);

    let body = hook_body(&hook).await;
    let blocks = body["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 2);
    assert!(
        blocks[0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("Environment: test")
    );
    assert!(
        blocks[1]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("Error: status 503, expected 200")
    );
    assert!(body["text"].as_str().unwrap().contains("0/1 targets healthy"));
}

#[tokio::test]
async fn test_slack_report_names_late_failure_in_large_sweep() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 200, Duration::ZERO).await;
    mount_target(&targets, "/payments", 500, Duration::ZERO).await;
    mount_hook(&hook, 200).await;

    let mut entries: Vec<_> = (0..55)
        .map(|i| target(&format!("svc-{i}"), format!("{}/health", targets.uri())))
        .collect();
    entries.push(target("payments", format!("{}/payments", targets.uri())));
    let config = config_with_channel(
        entries,
        json!({ "slack": { "url": format!("{}/hook", hook.uri()) } }),
    );
    let result = invoke(&config).await;
    assert_eq!(result.status, InvocationStatus::Degraded);

    let body = hook_body(&hook).await.to_string();
    assert!(body.contains("*payments* (backend) UNHEALTHY"));
    assert!(!body.contains("more targets"));
}

#[tokio::test]
async fn test_discord_channel_receives_embed() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 200, Duration::ZERO).await;
    mount_hook(&hook, 204).await;

    let config = config_with_channel(
        vec![target("api", format!("{}/health", targets.uri()))],
        json!({ "discord": { "url": format!("{}/hook", hook.uri()), "user_id": "7" } }),
    );
    let result = invoke(&config).await;
    assert_eq!(result.status, InvocationStatus::Success);

    let body = hook_body(&hook).await;
    assert!(body.get("content").is_none());
    assert_eq!(body["embeds"][0]["title"], "✅ Service Health OK");
    assert_eq!(body["embeds"][0]["fields"][0]["name"], "✅ api (backend)");
}

#[tokio::test]
async fn test_on_failure_policy_skips_webhook_when_healthy() {
    let targets = MockServer::start().await;
    let hook = MockServer::start().await;
    mount_target(&targets, "/health", 200, Duration::ZERO).await;

    let mut config = webhook_config(
        vec![target("api", format!("{}/health", targets.uri()))],
        &hook,
    );
    if let Some(notification) = config.notification.as_mut() {
        notification.policy = health_sweep::config::NotifyPolicy::OnFailure;
    }
    let result = invoke(&config).await;

    assert_eq!(result.status, InvocationStatus::Success);
    assert_eq!(result.notification, Some(DispatchOutcome::Suppressed));
    assert!(hook.received_requests().await.unwrap().is_empty());
}
