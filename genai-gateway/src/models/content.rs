//! Content parts exchanged with the model provider.
//!
//! Parts use the provider's JSON shape (`{"text": ...}`,
//! `{"inlineData": {"mimeType": ..., "data": <base64>}}`). Anything else the
//! provider sends back is kept verbatim so it reaches the client untouched.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text(TextPart),
    InlineData(InlineDataPart),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InlineDataPart {
    pub inline_data: Blob,
}

/// Raw bytes tagged with their MIME type; `data` is standard base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(TextPart { text: text.into() })
    }

    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Part::InlineData(InlineDataPart {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: STANDARD.encode(bytes),
            },
        })
    }
}
