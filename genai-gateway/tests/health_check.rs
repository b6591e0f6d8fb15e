//! End-to-end tests: the real server on a random port, talking to a mocked
//! Gemini API.

use genai_gateway::config::GatewayConfig;
use genai_gateway::startup::Application;
use reqwest::{multipart, Client, StatusCode};
use serde_json::json;
use service_core::config::Config as CommonConfig;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Spawn the application on a random port and return the port number.
async fn spawn_app(gemini: &MockServer) -> u16 {
    let vars: HashMap<&str, String> = HashMap::from([
        ("API_KEY", "test-api-key".to_string()),
        ("HTTP_PORT", "0".to_string()),
        ("GEMINI_API_BASE", format!("{}/v1beta", gemini.uri())),
    ]);
    let common = CommonConfig {
        log_level: "error".to_string(),
        otlp_endpoint: None,
    };

    let config = GatewayConfig::from_lookup(common, |key| vars.get(key).cloned())
        .expect("Failed to load config");
    let app = Application::build(config)
        .await
        .expect("Failed to build application");

    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    port
}

fn form(kind: &str, text: &str) -> multipart::Form {
    multipart::Form::new()
        .text("type", kind.to_string())
        .text("text", text.to_string())
        .part(
            "image",
            multipart::Part::bytes(b"\x89PNG\r\n\x1a\n".to_vec())
                .file_name("image.png")
                .mime_str("image/png")
                .unwrap(),
        )
}

#[tokio::test]
async fn health_check_returns_ok() {
    let gemini = MockServer::start().await;
    let port = spawn_app(&gemini).await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "genai-gateway");
}

#[tokio::test]
async fn multimodal_request_round_trips_through_gemini() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-pro-vision:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "A PNG header." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    let port = spawn_app(&gemini).await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/", port))
        .multipart(form("multimodal", "Describe"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!([{ "text": "A PNG header." }]));
}

#[tokio::test]
async fn provider_error_surfaces_as_server_error() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-pro:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&gemini)
        .await;

    let port = spawn_app(&gemini).await;

    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/", port))
        .multipart(form("modal", "Hello"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert!(body.starts_with("error generating content to text: Hello. error:"));
    assert!(body.contains("overloaded"));
}

#[tokio::test]
async fn metrics_endpoint_responds() {
    let gemini = MockServer::start().await;
    let port = spawn_app(&gemini).await;

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}
