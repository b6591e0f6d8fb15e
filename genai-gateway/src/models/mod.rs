pub mod content;
pub mod generation;

pub use content::{Blob, InlineDataPart, Part, TextPart};
pub use generation::{GenerationForm, GenerationMode, GenerationRequest, ImagePolicy, ImageUpload};
