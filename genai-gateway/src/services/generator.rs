//! Mode dispatch: turns a validated request into a provider call and returns
//! the parts of the first candidate.

use crate::config::ModelConfig;
use crate::models::generation::IMAGE_MIME_TYPE;
use crate::models::{GenerationMode, GenerationRequest, Part};
use crate::services::providers::{ContentGenerator, ProviderError};
use metrics::{counter, histogram};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("error generating content to text: {text}. error: {source}")]
    TextFailed {
        text: String,
        #[source]
        source: ProviderError,
    },

    #[error("error generating content to text: {text}, with this image, error: {source}")]
    VisionFailed {
        text: String,
        #[source]
        source: ProviderError,
    },

    #[error("error generating response")]
    EmptyResponse,
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        AppError::UpstreamError(err.to_string())
    }
}

pub struct Generator {
    client: Arc<dyn ContentGenerator>,
    models: ModelConfig,
}

impl Generator {
    pub fn new(client: Arc<dyn ContentGenerator>, models: ModelConfig) -> Self {
        Self { client, models }
    }

    /// Input parts for a request: the text alone, or the image followed by the
    /// text.
    pub fn build_parts(request: &GenerationRequest) -> Vec<Part> {
        match (request.mode, &request.image) {
            (GenerationMode::TextAndImage, Some(image)) => vec![
                Part::inline_data(IMAGE_MIME_TYPE, image),
                Part::text(request.text.as_str()),
            ],
            _ => vec![Part::text(request.text.as_str())],
        }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Part>, GenerateError> {
        let mode = request.mode;
        let model = self.models.model_for(mode);
        let start = Instant::now();

        let result = self.dispatch(model, request).await;

        histogram!("generation_duration_seconds", "mode" => mode.as_str())
            .record(start.elapsed().as_secs_f64());

        let outcome = match &result {
            Ok(parts) => {
                tracing::info!(%mode, model, parts = parts.len(), "Generation completed");
                "success"
            }
            Err(GenerateError::EmptyResponse) => {
                tracing::warn!(%mode, model, "Provider returned no candidates");
                "empty"
            }
            Err(e) => {
                tracing::error!(%mode, model, error = %e, "Generation failed");
                "error"
            }
        };
        counter!("generation_requests_total", "mode" => mode.as_str(), "outcome" => outcome)
            .increment(1);

        result
    }

    async fn dispatch(&self, model: &str, request: &GenerationRequest) -> Result<Vec<Part>, GenerateError> {
        let parts = Self::build_parts(request);

        tracing::debug!(
            mode = %request.mode,
            model,
            text_len = request.text.len(),
            image_bytes = request.image.as_ref().map_or(0, |b| b.len()),
            "Dispatching generation request"
        );

        let response = self
            .client
            .generate_content(model, parts)
            .await
            .map_err(|source| match request.mode {
                GenerationMode::TextOnly => GenerateError::TextFailed {
                    text: request.text.clone(),
                    source,
                },
                GenerationMode::TextAndImage => GenerateError::VisionFailed {
                    text: request.text.clone(),
                    source,
                },
            })?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(GenerateError::EmptyResponse)?;

        Ok(candidate.content.map(|c| c.parts).unwrap_or_default())
    }
}
