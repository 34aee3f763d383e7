use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use growthboard_core::analytics::AnalyticsQueryClient;
use growthboard_core::query::{MetricKind, MetricQuery, MetricResult};
use growthboard_core::window::{resolve_windows, DashboardWindows, LookbackDays};
use growthboard_sources::{http_client, Ga4Client, ServiceAccountKey, ServiceAccountTokens};

const TEST_KEY_PEM: &str = include_str!("fixtures/test_service_account_key.pem");

fn service_account_json(server: &MockServer) -> String {
    json!({
        "type": "service_account",
        "project_id": "growth-test",
        "private_key_id": "kid-1",
        "private_key": TEST_KEY_PEM,
        "client_email": "dashboard@growth-test.iam.gserviceaccount.com",
        "token_uri": format!("{}/token", server.uri()),
    })
    .to_string()
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn ga4(server: &MockServer) -> Ga4Client {
    let http = http_client(Duration::from_secs(5)).expect("http client");
    let key = ServiceAccountKey::from_json(&service_account_json(server)).expect("key");
    let tokens = ServiceAccountTokens::new(http.clone(), key).expect("tokens");
    Ga4Client::new(http, "123456", tokens).with_base_url(&format!("{}/v1beta", server.uri()))
}

fn windows() -> DashboardWindows {
    let now = Utc
        .with_ymd_and_hms(2026, 10, 19, 20, 0, 0)
        .single()
        .expect("timestamp");
    resolve_windows(now, chrono_tz::America::Los_Angeles, LookbackDays::Fourteen)
}

fn count_body(value: &str) -> serde_json::Value {
    json!({
        "dimensionHeaders": [],
        "metricHeaders": [{ "name": "eventCount", "type": "TYPE_INTEGER" }],
        "rows": [{ "metricValues": [{ "value": value }] }],
        "rowCount": 1
    })
}

#[tokio::test]
async fn test_named_event_count_round_trip() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .and(header("authorization", "Bearer ya29.test-token"))
        .and(body_partial_json(json!({
            "dateRanges": [{ "startDate": "2026-10-06", "endDate": "2026-10-19" }],
            "metrics": [{ "name": "eventCount" }],
            "dimensionFilter": {
                "filter": {
                    "fieldName": "eventName",
                    "stringFilter": { "value": "click_register", "matchType": "EXACT" }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_body("150")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalyticsQueryClient::new(Arc::new(ga4(&server)));
    let result = client
        .count_named_event("click_register", &windows().lookback)
        .await;
    assert_eq!(result, MetricResult::Value(150));
}

#[tokio::test]
async fn test_token_is_reused_across_queries() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_body("7")))
        .expect(3)
        .mount(&server)
        .await;

    let client = AnalyticsQueryClient::new(Arc::new(ga4(&server)));
    let w = windows();
    assert_eq!(client.count_new_users(&w.today).await, MetricResult::Value(7));
    assert_eq!(
        client.count_page_visits("/naming", &w.lookback).await,
        MetricResult::Value(7)
    );
    assert_eq!(
        client.count_named_event("sign_up", &w.today).await,
        MetricResult::Value(7)
    );
}

#[tokio::test]
async fn test_empty_report_counts_zero() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .and(body_partial_json(json!({ "metrics": [{ "name": "newUsers" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rowCount": 0 })))
        .mount(&server)
        .await;

    let client = AnalyticsQueryClient::new(Arc::new(ga4(&server)));
    assert_eq!(
        client.count_new_users(&windows().today).await,
        MetricResult::Value(0)
    );
}

#[tokio::test]
async fn test_permission_denied_is_unavailable() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let backend = ga4(&server);
    let query = MetricQuery::new(MetricKind::NewUsers, windows().today);
    let err = growthboard_core::analytics::AnalyticsBackend::run_count(&backend, &query)
        .await
        .expect_err("403 must fail");
    assert!(err.to_string().contains("403"));

    let client = AnalyticsQueryClient::new(Arc::new(backend));
    assert_eq!(
        client.count_new_users(&windows().today).await,
        MetricResult::Unavailable
    );
}

#[tokio::test]
async fn test_token_endpoint_failure_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_body("1")))
        .expect(0)
        .mount(&server)
        .await;

    let client = AnalyticsQueryClient::new(Arc::new(ga4(&server)));
    assert_eq!(
        client.count_named_event("sign_up", &windows().today).await,
        MetricResult::Unavailable
    );
}

#[tokio::test]
async fn test_probe_reports_row_count() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/v1beta/properties/123456:runReport"))
        .and(body_partial_json(json!({
            "dateRanges": [{ "startDate": "yesterday", "endDate": "today" }],
            "metrics": [{ "name": "activeUsers" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_body("3")))
        .mount(&server)
        .await;

    assert_eq!(ga4(&server).probe().await.expect("probe"), 1);
}
