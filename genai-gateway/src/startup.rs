//! Application startup and lifecycle management.

use crate::config::GatewayConfig;
use crate::handlers::{generate, health_check, metrics};
use crate::models::ImagePolicy;
use crate::services::providers::gemini::GeminiClient;
use crate::services::providers::ContentGenerator;
use crate::services::Generator;
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub image_policy: ImagePolicy,
}

impl AppState {
    pub fn new(generator: Arc<Generator>, image_policy: ImagePolicy) -> Self {
        Self {
            generator,
            image_policy,
        }
    }
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", post(generate))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the Gemini client described by `config`.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let client = GeminiClient::new(&config.gemini)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to create Gemini client: {}", e)))?;

        tracing::info!(
            api_base = %config.gemini.api_base,
            text_model = %config.models.text_model,
            vision_model = %config.models.vision_model,
            "Initialized Gemini client"
        );

        Self::build_with_client(config, Arc::new(client)).await
    }

    /// Build the application around an already constructed provider.
    pub async fn build_with_client(
        config: GatewayConfig,
        client: Arc<dyn ContentGenerator>,
    ) -> Result<Self, AppError> {
        let generator = Arc::new(Generator::new(client, config.models.clone()));
        let state = AppState::new(generator, config.image_policy);
        let router = build_router(state, config.server.max_upload_bytes);

        // Port 0 picks a random port (used by tests).
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, source);
            AppError::ServerBindError { addr, source }
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, image_policy = ?config.image_policy, "genai-gateway listening");

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
