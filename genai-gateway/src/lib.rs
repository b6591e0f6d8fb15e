//! genai-gateway: a thin HTTP facade over the Gemini generative-language API.
//!
//! `POST /` takes a form with `type` (`modal` or `multimodal`), `text`, and an
//! `image` file part, forwards it to the matching Gemini model, and answers with
//! the parts of the first returned candidate as JSON.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
