//! Shared helpers for genai-gateway integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use genai_gateway::config::ModelConfig;
use genai_gateway::models::ImagePolicy;
use genai_gateway::services::providers::mock::MockContentGenerator;
use genai_gateway::services::Generator;
use genai_gateway::startup::{build_router, AppState};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "gateway-test-boundary";

/// Smallest valid PNG signature plus an IHDR chunk header; enough to stand in
/// for an uploaded image.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Builder for `multipart/form-data` request bodies.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn image(self, data: &[u8]) -> Self {
        self.file("image", "image.png", "image/png", data)
    }

    /// Ends the body inside an `image` file part, with no closing boundary.
    pub fn truncated_image(mut self, data: &[u8]) -> Vec<u8> {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"image.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn urlencoded_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub const TEST_BODY_LIMIT: usize = 1024 * 1024;

pub fn app_with(mock: Arc<MockContentGenerator>, policy: ImagePolicy) -> Router {
    let generator = Arc::new(Generator::new(mock, ModelConfig::default()));
    build_router(AppState::new(generator, policy), TEST_BODY_LIMIT)
}

pub fn app(mock: Arc<MockContentGenerator>) -> Router {
    app_with(mock, ImagePolicy::Always)
}

/// Send `request` through `app` and return status and raw body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
