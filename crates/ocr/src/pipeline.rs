use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use tillscan_core::{Config, ReceiptItem};

use crate::extract::{Extractor, LineMatch};
use crate::recognizer::{
    backend_from_config, recognize_best, OcrBackend, OcrError, PageSegMode, Recognition,
};
use crate::summary::{ReceiptSummary, TotalCheck};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of a single receipt processing run.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Raw text of the winning recognition variant.
    pub ocr_text: String,
    pub page_seg_mode: PageSegMode,
    /// Classified lines in receipt order.
    pub lines: Vec<LineMatch>,
    pub summary: ReceiptSummary,
    pub check: Option<TotalCheck>,
}

impl OcrResult {
    pub fn items(&self) -> Vec<ReceiptItem> {
        self.lines.iter().map(LineMatch::item).collect()
    }
}

/// Orchestrates: read → OCR (best of several variants) → line extraction.
pub struct ReceiptPipeline<R: OcrBackend> {
    recognizer: R,
    modes: Vec<PageSegMode>,
    fallback: bool,
}

impl ReceiptPipeline<Box<dyn OcrBackend>> {
    /// The configured backend, recognition variants and fallback policy.
    pub fn from_config(config: &Config) -> Result<Self, OcrError> {
        let modes = config
            .ocr
            .page_seg_modes
            .iter()
            .map(|m| PageSegMode::new(*m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(backend_from_config(&config.ocr))
            .with_modes(modes)
            .with_fallback(config.extraction.fallback))
    }
}

impl<R: OcrBackend> ReceiptPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            modes: PageSegMode::DEFAULT_SEQUENCE.to_vec(),
            fallback: true,
        }
    }

    pub fn with_modes(mut self, modes: Vec<PageSegMode>) -> Self {
        self.modes = modes;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    /// OCR only: read the image and return the best variant's text, for
    /// callers that interpret the text themselves.
    pub async fn recognize_file(&self, path: &Path) -> Result<Recognition, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.recognize_bytes(&bytes)
    }

    pub fn recognize_bytes(&self, data: &[u8]) -> Result<Recognition, PipelineError> {
        let recognition = recognize_best(&self.recognizer, data, &self.modes)?;
        info!(
            mode = %recognition.mode,
            lines = recognition.line_count,
            "selected recognition variant"
        );
        Ok(recognition)
    }

    /// Process a file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<OcrResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes)
    }

    /// Process raw image bytes (from an upload or file read).
    pub fn process_bytes(&self, data: &[u8]) -> Result<OcrResult, PipelineError> {
        let recognition = self.recognize_bytes(data)?;
        let receipt = Extractor::default()
            .with_fallback(self.fallback)
            .extract_receipt(&recognition.text);

        Ok(OcrResult {
            ocr_text: recognition.text,
            page_seg_mode: recognition.mode,
            lines: receipt.lines,
            summary: receipt.summary,
            check: receipt.check,
        })
    }

    /// Like [`process_file`](Self::process_file), but any failure becomes an
    /// empty list. Callers always get a list back.
    pub async fn scan_file(&self, path: &Path) -> Vec<ReceiptItem> {
        match self.process_file(path).await {
            Ok(result) => result.items(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "receipt extraction failed");
                Vec::new()
            }
        }
    }
}
