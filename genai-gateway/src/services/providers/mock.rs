//! Mock provider for testing.

use super::{ContentGenerator, GenerateContentResponse, ProviderError};
use crate::models::Part;
use async_trait::async_trait;
use std::sync::Mutex;

/// A call received by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub parts: Vec<Part>,
}

enum Outcome {
    Respond(GenerateContentResponse),
    Fail(String),
}

/// Deterministic provider that returns a canned outcome and records calls.
pub struct MockContentGenerator {
    outcome: Outcome,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockContentGenerator {
    /// Answer every call with one candidate holding `parts`.
    pub fn with_parts(parts: Vec<Part>) -> Self {
        Self::with_response(GenerateContentResponse::from_parts(parts))
    }

    pub fn with_response(response: GenerateContentResponse) -> Self {
        Self {
            outcome: Outcome::Respond(response),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every call with zero candidates.
    pub fn empty() -> Self {
        Self::with_response(GenerateContentResponse::default())
    }

    /// Fail every call with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(message.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
    ) -> Result<GenerateContentResponse, ProviderError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                model: model.to_string(),
                parts,
            });

        match &self.outcome {
            Outcome::Respond(response) => Ok(response.clone()),
            Outcome::Fail(message) => Err(ProviderError::ApiError(message.clone())),
        }
    }
}
