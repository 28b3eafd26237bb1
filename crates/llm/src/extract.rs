use tracing::{debug, warn};

use tillscan_core::ReceiptItem;

use crate::generator::TextGenerator;
use crate::response::parse_items;

pub const EXTRACTION_INSTRUCTION: &str = "\
The text below was read by OCR from a retail receipt. List every purchased item \
with its price. Ignore totals, subtotals, tax, payment and change lines. \
Respond with only a JSON array of objects with exactly two keys: \"name\" (string) \
and \"price\" (number). No markdown, no explanation.";

/// Receipt extraction delegated to a [`TextGenerator`].
pub struct LlmExtractor<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> LlmExtractor<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Never fails: a model error or unusable reply yields an empty list.
    pub async fn extract(&self, ocr_text: &str) -> Vec<ReceiptItem> {
        if ocr_text.trim().is_empty() {
            return Vec::new();
        }

        let prompt = format!("{EXTRACTION_INSTRUCTION}\n\n{ocr_text}");
        let reply = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "model call failed");
                return Vec::new();
            }
        };

        match parse_items(&reply) {
            Ok(items) => {
                debug!(items = items.len(), "model extraction parsed");
                items
            }
            Err(e) => {
                warn!(error = %e, "model reply could not be parsed");
                Vec::new()
            }
        }
    }
}
