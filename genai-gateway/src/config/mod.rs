use crate::models::{GenerationMode, ImagePolicy};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_HTTP_PORT: &str = "8085";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-pro";
const DEFAULT_VISION_MODEL: &str = "gemini-pro-vision";
const DEFAULT_PROVIDER_TIMEOUT_SECS: &str = "120";

/// Matches the in-memory multipart threshold of common form parsers (32 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: &str = "33554432";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub server: ServerConfig,
    pub gemini: GeminiSettings,
    pub models: ModelConfig,
    pub image_policy: ImagePolicy,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

/// Model identifier used for each generation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub text_model: String,
    pub vision_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
        }
    }
}

impl ModelConfig {
    pub fn model_for(&self, mode: GenerationMode) -> &str {
        match mode {
            GenerationMode::TextOnly => &self.text_model,
            GenerationMode::TextAndImage => &self.vision_model,
        }
    }
}

impl GatewayConfig {
    /// Load from the process environment (and `.env`, if present).
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = get_env(&lookup, "HTTP_PORT", Some(DEFAULT_HTTP_PORT))?;
        let max_upload_bytes = get_env(&lookup, "MAX_UPLOAD_BYTES", Some(DEFAULT_MAX_UPLOAD_BYTES))?;
        let timeout_secs = get_env(
            &lookup,
            "PROVIDER_TIMEOUT_SECS",
            Some(DEFAULT_PROVIDER_TIMEOUT_SECS),
        )?;
        let image_policy = get_env(&lookup, "IMAGE_REQUIRED_FOR", Some("all"))?;

        Ok(GatewayConfig {
            common,
            server: ServerConfig {
                port: parse_var("HTTP_PORT", &port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", &max_upload_bytes)?,
            },
            gemini: GeminiSettings {
                api_key: Secret::new(get_env(&lookup, "API_KEY", None)?),
                api_base: get_env(&lookup, "GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE))?
                    .trim_end_matches('/')
                    .to_string(),
                timeout_secs: parse_var("PROVIDER_TIMEOUT_SECS", &timeout_secs)?,
            },
            models: ModelConfig {
                text_model: get_env(&lookup, "GEMINI_TEXT_MODEL", Some(DEFAULT_TEXT_MODEL))?,
                vision_model: get_env(&lookup, "GEMINI_VISION_MODEL", Some(DEFAULT_VISION_MODEL))?,
            },
            image_policy: parse_var("IMAGE_REQUIRED_FOR", &image_policy)?,
        })
    }
}

/// Unset variables fall back to `default`; a variable that is set must not be
/// blank.
fn get_env<F>(lookup: &F, key: &str, default: Option<&str>) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) if val.trim().is_empty() => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is set but empty",
            key
        ))),
        Some(val) => Ok(val),
        None => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, value, e))
    })
}
