//! Integration tests for the HTTP probe executor
//!
//! These tests verify that:
//! - Expected status codes yield Healthy
//! - Unexpected status codes yield Unhealthy with the observed code
//! - Slow targets time out as Errored
//! - Connection failures are Errored without a status
//! - Custom headers and the configured method are sent
//! - Redirects are only followed when no 3xx status is expected

use std::sync::Arc;
use std::time::Duration;

use health_sweep::Verdict;
use health_sweep::config::{HttpMethod, ServiceKind, TargetSpec};
use health_sweep::probe::{HttpTransport, ProbeExecutor};
use pretty_assertions::assert_eq;
use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

fn spec(name: &str, url: &str) -> TargetSpec {
    TargetSpec::new(name, Url::parse(url).unwrap(), ServiceKind::Backend)
}

fn executor() -> ProbeExecutor<HttpTransport> {
    ProbeExecutor::new(HttpTransport::new().unwrap())
}

#[tokio::test]
async fn test_expected_status_is_healthy() {
    let mock_server = MockServer::start().await;
    mount_target(&mock_server, "/health", 200, Duration::from_millis(50)).await;

    let outcome = executor()
        .probe(Arc::new(spec("api", &format!("{}/health", mock_server.uri()))))
        .await;

    assert_eq!(outcome.verdict, Verdict::Healthy);
    assert_eq!(outcome.observed_status, Some(200));
    assert_eq!(outcome.detail, None);
    assert!(outcome.latency >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_unexpected_status_is_unhealthy() {
    let mock_server = MockServer::start().await;
    mount_target(&mock_server, "/missing", 404, Duration::ZERO).await;

    let target = spec("api", &format!("{}/missing", mock_server.uri()))
        .with_expected_status([200, 429]);
    let outcome = executor().probe(Arc::new(target)).await;

    assert_eq!(outcome.verdict, Verdict::Unhealthy);
    assert_eq!(outcome.observed_status, Some(404));
    assert_eq!(
        outcome.detail.as_deref(),
        Some("status 404, expected one of 200, 429")
    );
}

#[tokio::test]
async fn test_alternative_expected_status_is_healthy() {
    let mock_server = MockServer::start().await;
    mount_target(&mock_server, "/limited", 429, Duration::ZERO).await;

    let target = spec("api", &format!("{}/limited", mock_server.uri()))
        .with_expected_status([200, 429]);
    let outcome = executor().probe(Arc::new(target)).await;

    assert_eq!(outcome.verdict, Verdict::Healthy);
    assert_eq!(outcome.observed_status, Some(429));
}

#[tokio::test]
async fn test_slow_target_times_out() {
    let mock_server = MockServer::start().await;
    mount_target(&mock_server, "/slow", 200, Duration::from_secs(3)).await;

    let target = spec("slow", &format!("{}/slow", mock_server.uri()))
        .with_timeout(Duration::from_millis(300));
    let outcome = executor().probe(Arc::new(target)).await;

    assert_eq!(outcome.verdict, Verdict::Errored);
    assert_eq!(outcome.detail.as_deref(), Some("timeout"));
    assert_eq!(outcome.observed_status, None);
    assert!(outcome.latency <= Duration::from_millis(300));
}

#[tokio::test]
async fn test_unreachable_target_is_connection_failure() {
    let outcome = executor().probe(Arc::new(spec("gone", UNREACHABLE))).await;

    assert_eq!(outcome.verdict, Verdict::Errored);
    assert_eq!(outcome.observed_status, None);
    assert!(
        outcome
            .detail
            .as_deref()
            .unwrap()
            .starts_with("connection failure"),
        "unexpected detail: {:?}",
        outcome.detail
    );
}

#[tokio::test]
async fn test_custom_headers_are_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("x-api-key", "s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let target = spec("private", &format!("{}/private", mock_server.uri())).with_header(
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static("s3cret"),
    );
    let outcome = executor().probe(Arc::new(target)).await;

    assert_eq!(outcome.verdict, Verdict::Healthy);
}

#[tokio::test]
async fn test_head_method_is_used() {
    let mock_server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let target =
        spec("ping", &format!("{}/ping", mock_server.uri())).with_method(HttpMethod::Head);
    let outcome = executor().probe(Arc::new(target)).await;

    assert_eq!(outcome.verdict, Verdict::Healthy);
}

#[tokio::test]
async fn test_redirect_is_classified_when_expected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    mount_target(&mock_server, "/new", 200, Duration::ZERO).await;
    let url = format!("{}/old", mock_server.uri());

    let moved = spec("moved", &url).with_expected_status([301]);
    let outcome = executor().probe(Arc::new(moved)).await;
    assert_eq!(outcome.verdict, Verdict::Healthy);
    assert_eq!(outcome.observed_status, Some(301));

    let followed = executor().probe(Arc::new(spec("followed", &url))).await;
    assert_eq!(followed.verdict, Verdict::Healthy);
    assert_eq!(followed.observed_status, Some(200));
}
