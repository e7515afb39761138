use reqwest::StatusCode;
use serde_json::json;

mod common;

use common::{MockProvider, REJECTED_TOKEN, TestApp};

fn send_body(tokens: &[&str]) -> serde_json::Value {
    json!({
        "pushTokens": tokens,
        "title": "Order shipped",
        "content": "Your parcel is on its way",
        "data": {"orderId": 42}
    })
}

#[tokio::test]
async fn test_send_empty_body_echoes_braces() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app.post_json("/send", &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"return_code": 400, "data": "{}"}));
    assert!(app.provider.sent_chunks().is_empty());
}

#[tokio::test]
async fn test_send_missing_field_echoes_raw_body() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) =
        app.post_raw("/send", r#"{"pushTokens":["ExpoPushToken[a]"],"title":"t","content":"c"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["return_code"], 400);
    assert_eq!(body["data"], r#"{"pushTokens":["ExpoPushToken[a]"],"title":"t","content":"c"}"#);
}

#[tokio::test]
async fn test_send_malformed_json_is_treated_as_empty() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app.post_raw("/send", "{\"pushTokens\": [").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"return_code": 400, "data": "{}"}));
}

#[tokio::test]
async fn test_send_non_json_content_type_is_treated_as_empty() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app
        .post_with_content_type(
            "/send",
            "text/plain",
            r#"{"pushTokens":["ExpoPushToken[a]"],"title":"t","content":"c"}"#,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"return_code": 400, "data": "{}"}));
    assert!(app.provider.sent_chunks().is_empty());
}

#[tokio::test]
async fn test_send_returns_tickets_and_skips_invalid_tokens() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app
        .post_json("/send", &send_body(&["ExponentPushToken[a]", "definitely-not-a-token", "ExpoPushToken[b]"]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "return_code": 200,
            "data": [{"status": "ok", "id": "0"}, {"status": "ok", "id": "1"}]
        })
    );
    assert_eq!(app.provider.sent_chunks(), vec![vec!["ExponentPushToken[a]", "ExpoPushToken[b]"]]);
}

#[tokio::test]
async fn test_send_surfaces_per_message_errors() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app.post_json("/send", &send_body(&["ExpoPushToken[a]", REJECTED_TOKEN])).await;

    assert_eq!(status, StatusCode::OK);
    let tickets = body["data"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0]["status"], "ok");
    assert_eq!(tickets[1]["status"], "error");
    assert_eq!(tickets[1]["details"]["error"], "DeviceNotRegistered");
}

#[tokio::test]
async fn test_send_aggregates_tickets_from_all_chunks() {
    let app = TestApp::spawn(MockProvider { message_limit: 2, ..MockProvider::default() }).await;
    let tokens: Vec<String> = (0..5).map(|i| format!("ExpoPushToken[{i}]")).collect();
    let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();

    let (status, body) = app.post_json("/send", &send_body(&token_refs)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"].as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    assert_eq!(app.provider.sent_chunks().len(), 3);
}

#[tokio::test]
async fn test_send_provider_failure_is_bad_gateway() {
    let app = TestApp::spawn(MockProvider {
        message_limit: 1,
        failing_send_calls: [1].into_iter().collect(),
        ..MockProvider::default()
    })
    .await;

    let (status, body) = app.post_json("/send", &send_body(&["ExpoPushToken[a]", "ExpoPushToken[b]"])).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"return_code": 502, "data": "unable to connect to expo server"}));
}

#[tokio::test]
async fn test_send_hanging_provider_is_bad_gateway() {
    let app = TestApp::spawn(MockProvider { hang: true, ..MockProvider::default() }).await;

    let (status, body) = app.post_json("/send", &send_body(&["ExpoPushToken[a]"])).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["return_code"], 502);
}

#[tokio::test]
async fn test_send_with_only_invalid_tokens_returns_empty_list() {
    let app = TestApp::spawn(MockProvider::default()).await;

    let (status, body) = app.post_json("/send", &send_body(&["nope"])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"return_code": 200, "data": []}));
    assert!(app.provider.sent_chunks().is_empty());
}
