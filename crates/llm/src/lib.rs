//! Receipt item extraction by a hosted text-generation model.
//!
//! This is the alternative to the regex catalog in `tillscan-ocr`: the raw
//! OCR text goes to a model, and whatever JSON comes back is coerced into
//! `{name, price}` records. Every failure on this path yields an empty list.

pub mod extract;
pub mod generator;
pub mod response;

use thiserror::Error;

pub use extract::{LlmExtractor, EXTRACTION_INSTRUCTION};
pub use generator::{GeminiClient, MockGenerator, TextGenerator};
pub use response::{parse_items, strip_code_fences};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API key not set: environment variable {0} is missing")]
    MissingApiKey(String),
    #[error("Model returned no text")]
    EmptyResponse,
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("Unparsable model output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid price in model output: '{0}'")]
    InvalidPrice(String),
}
