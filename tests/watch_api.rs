//! Integration tests for the viewer endpoints.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use watchtime_auth::Role;
use watchtime_core::config::{AppConfig, QuotaConfig};
use watchtime_core::traits::catalog::ContentCatalog;
use watchtime_core::traits::store::QuotaStore;
use watchtime_core::types::{PostId, UserId};

use helpers::TestApp;

fn app_with_default_minutes(minutes: u32) -> TestApp {
    TestApp::with_config(AppConfig {
        quota: QuotaConfig {
            default_limit_minutes: minutes,
            ..QuotaConfig::default()
        },
        ..AppConfig::default()
    })
}

fn entry(post: u64, seconds: i64) -> serde_json::Value {
    json!({ "context": { "postId": post }, "seconds": seconds })
}

#[tokio::test]
async fn test_anonymous_status_is_zero() {
    let app = TestApp::new();

    let response = app
        .request("GET", "/api/watch/status?postId=1&courseTitle=Intro", None, None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["global"]["enforced"], json!(false));
    assert_eq!(data["global"]["limitSeconds"], json!(0));
    assert_eq!(data["context"]["key"], json!("post-1"));
    assert_eq!(data["context"]["courseTitle"], json!("Intro"));
    assert_eq!(data["context"]["consumedSeconds"], json!(0));
}

#[tokio::test]
async fn test_malformed_context_reads_as_empty() {
    let app = TestApp::new();
    let token = app.token(1, Role::Viewer);

    let response = app
        .request("GET", "/api/watch/status?postId=abc", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert!(data["context"].is_null());
    assert_eq!(data["contextKey"], json!(""));
    assert_eq!(data["global"]["limitSeconds"], json!(10_800));
}

#[tokio::test]
async fn test_invalid_token_degrades_status_but_rejects_usage() {
    let app = TestApp::new();

    let status = app
        .request("GET", "/api/watch/status?postId=1", None, Some("not-a-token"))
        .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.data()["global"]["enforced"], json!(false));

    let usage = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "seconds": 10 })),
            Some("not-a-token"),
        )
        .await;
    assert_eq!(usage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(usage.body["success"], json!(false));
    assert_eq!(usage.body["error"], json!("UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_usage_requires_authentication() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "entries": [entry(1, 10)] })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.get_global(UserId(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_global_cap_truncates_batch() {
    let app = TestApp::new();
    let token = app.token(1, Role::Viewer);
    app.store.set_global(UserId(1), 10_750).await.unwrap();

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "seconds": 0, "entries": [entry(4, 100)] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["appliedSeconds"], json!(50));
    assert_eq!(data["global"]["consumedSeconds"], json!(10_800));
    assert_eq!(app.store.get(UserId(1), PostId(4)).await.unwrap(), 50);

    let status = app
        .request("GET", "/api/watch/status?postId=4", None, Some(&token))
        .await;
    let global = &status.data()["global"];
    assert_eq!(global["enforced"], json!(true));
    assert_eq!(global["remainingSeconds"], json!(0));
}

#[tokio::test]
async fn test_content_override_caps_context_ledger() {
    let app = app_with_default_minutes(0);
    let token = app.token(2, Role::Viewer);
    app.catalog
        .set_limit_override_minutes(PostId(2), Some(1))
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "entries": [entry(2, 90)] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["appliedSeconds"], json!(60));
    assert_eq!(data["contexts"][0]["key"], json!("post-2"));
    assert_eq!(data["contexts"][0]["remainingSeconds"], json!(0));
    assert_eq!(data["global"]["enforced"], json!(false));
    assert_eq!(app.store.get(UserId(2), PostId(2)).await.unwrap(), 60);
}

#[tokio::test]
async fn test_same_context_entries_share_one_budget() {
    let app = app_with_default_minutes(0);
    let token = app.token(1, Role::Viewer);
    app.catalog
        .set_limit_override_minutes(PostId(1), Some(1))
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "entries": [entry(1, 40), entry(1, 40)] })),
            Some(&token),
        )
        .await;

    let data = response.data();
    assert_eq!(data["appliedSeconds"], json!(60));
    assert_eq!(data["contexts"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.store.get(UserId(1), PostId(1)).await.unwrap(), 60);
}

#[tokio::test]
async fn test_legacy_scalar_does_not_stack_with_entries() {
    let app = app_with_default_minutes(0);
    let token = app.token(1, Role::Viewer);

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "seconds": 30, "entries": [entry(4, 10)] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.data()["appliedSeconds"], json!(30));
    assert_eq!(app.store.get_global(UserId(1)).await.unwrap(), 30);
    assert_eq!(app.store.get(UserId(1), PostId(4)).await.unwrap(), 10);
}

#[tokio::test]
async fn test_noop_batch_changes_nothing() {
    let app = TestApp::new();
    let token = app.token(1, Role::Viewer);
    app.store.set_global(UserId(1), 120).await.unwrap();

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "seconds": 0, "entries": [entry(1, 0), entry(2, -5)] })),
            Some(&token),
        )
        .await;

    let data = response.data();
    assert_eq!(data["appliedSeconds"], json!(0));
    assert_eq!(data["global"]["consumedSeconds"], json!(120));
    assert!(app.store.usage_for_user(UserId(1)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_entry_context_still_counts_globally() {
    let app = TestApp::new();
    let token = app.token(2, Role::Viewer);

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({
                "entries": [
                    { "context": "x", "seconds": 10 },
                    { "context": [1], "seconds": 5 },
                    entry(1, 20)
                ]
            })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["appliedSeconds"], json!(35));
    assert_eq!(data["global"]["consumedSeconds"], json!(35));
    assert_eq!(data["contexts"].as_array().map(Vec::len), Some(1));
    assert_eq!(app.store.get_global(UserId(2)).await.unwrap(), 35);
    assert_eq!(app.store.get(UserId(2), PostId(1)).await.unwrap(), 20);
}

#[tokio::test]
async fn test_oversized_report_rejected() {
    let app = TestApp::new();
    let token = app.token(1, Role::Viewer);

    let response = app
        .request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "entries": [entry(1, 1_000_000)] })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_concurrent_reports_hold_global_cap() {
    let app = app_with_default_minutes(1);
    let token = app.token(3, Role::Viewer);

    let requests = (0..20).map(|_| {
        app.request(
            "POST",
            "/api/watch/usage",
            Some(json!({ "entries": [entry(4, 7)] })),
            Some(&token),
        )
    });
    let responses = futures::future::join_all(requests).await;

    let applied: u64 = responses
        .iter()
        .map(|r| r.data()["appliedSeconds"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(applied, 60);
    assert_eq!(app.store.get_global(UserId(3)).await.unwrap(), 60);
    assert_eq!(app.store.get(UserId(3), PostId(4)).await.unwrap(), 60);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.data()["status"], json!("ok"));

    let detailed = app.request("GET", "/api/health/detailed", None, None).await;
    assert_eq!(detailed.status, StatusCode::OK);
    assert_eq!(detailed.data()["store"], json!("connected"));
    assert_eq!(detailed.data()["catalog"], json!("connected"));
}
