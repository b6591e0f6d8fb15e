use bytes::Bytes;
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const MISSING_FIELDS_MESSAGE: &str = "missing mandatory fields. type or text";
pub const INVALID_TYPE_MESSAGE: &str = "invalid type. Select modal or multimodal";
pub const MISSING_IMAGE_MESSAGE: &str = "missing image file";
pub const UNREADABLE_IMAGE_MESSAGE: &str = "error reading image";
pub const EMPTY_IMAGE_MESSAGE: &str = "image is required for multimodal generation";

/// MIME type attached to uploaded images when they are sent to the provider.
pub const IMAGE_MIME_TYPE: &str = "image/png";

/// Which generation strategy a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationMode {
    /// Wire value `modal`: a single text prompt.
    TextOnly,
    /// Wire value `multimodal`: an image followed by a text prompt.
    TextAndImage,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::TextOnly => "modal",
            GenerationMode::TextAndImage => "multimodal",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMode(pub String);

impl fmt::Display for InvalidMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown generation type '{}'", self.0)
    }
}

impl FromStr for GenerationMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modal" => Ok(GenerationMode::TextOnly),
            "multimodal" => Ok(GenerationMode::TextAndImage),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

/// When an uploaded image part is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
    /// Every request must carry a readable image, even `modal` ones.
    #[default]
    Always,
    /// Only `multimodal` requests need an image.
    MultimodalOnly,
}

impl ImagePolicy {
    /// `mode` is `None` when the request type did not parse.
    pub fn requires_image(&self, mode: Option<GenerationMode>) -> bool {
        match self {
            ImagePolicy::Always => true,
            ImagePolicy::MultimodalOnly => mode == Some(GenerationMode::TextAndImage),
        }
    }
}

impl FromStr for ImagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ImagePolicy::Always),
            "multimodal" => Ok(ImagePolicy::MultimodalOnly),
            other => Err(format!("expected 'all' or 'multimodal', got '{}'", other)),
        }
    }
}

/// State of the `image` file part after reading the form.
#[derive(Debug, Clone, Default)]
pub enum ImageUpload {
    #[default]
    Absent,
    Unreadable(String),
    Uploaded(Bytes),
}

impl ImageUpload {
    fn into_bytes(self) -> Result<Bytes, AppError> {
        match self {
            ImageUpload::Uploaded(bytes) => Ok(bytes),
            ImageUpload::Absent => Err(AppError::validation(MISSING_IMAGE_MESSAGE)),
            ImageUpload::Unreadable(reason) => {
                tracing::debug!(%reason, "Image part could not be read");
                Err(AppError::validation(UNREADABLE_IMAGE_MESSAGE))
            }
        }
    }
}

/// Raw form fields of a generation request, before validation.
#[derive(Debug, Clone, Default, Validate)]
pub struct GenerationForm {
    #[validate(length(min = 1))]
    pub kind: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub image: ImageUpload,
}

/// A validated request, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub text: String,
    /// Present (and non-empty) exactly when `mode` is `TextAndImage`.
    pub image: Option<Bytes>,
}

impl GenerationRequest {
    /// Checks run in order: mandatory fields, image (per `policy`), type.
    pub fn from_form(form: GenerationForm, policy: ImagePolicy) -> Result<Self, AppError> {
        if form.validate().is_err() {
            return Err(AppError::validation(MISSING_FIELDS_MESSAGE));
        }

        let parsed = form.kind.parse::<GenerationMode>();

        let image = if policy.requires_image(parsed.as_ref().ok().copied()) {
            Some(form.image.into_bytes()?)
        } else {
            form.image.into_bytes().ok()
        };

        let mode = parsed.map_err(|e| {
            tracing::debug!(error = %e, "Rejected generation type");
            AppError::validation(INVALID_TYPE_MESSAGE)
        })?;

        let image = match mode {
            GenerationMode::TextOnly => None,
            GenerationMode::TextAndImage => match image {
                Some(bytes) if !bytes.is_empty() => Some(bytes),
                _ => return Err(AppError::validation(EMPTY_IMAGE_MESSAGE)),
            },
        };

        Ok(GenerationRequest {
            mode,
            text: form.text,
            image,
        })
    }
}
