use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use tillscan_core::OcrConfig;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available: build with the `tesseract` feature")]
    NotAvailable,
    #[error("No recognition variant produced any text")]
    NoText,
    #[error("Invalid page segmentation mode: {0} (expected 0-13)")]
    InvalidPageSegMode(u8),
}

/// Tesseract page segmentation mode. Each mode is one recognition variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSegMode(u8);

impl PageSegMode {
    pub const SINGLE_COLUMN: Self = Self(4);
    pub const SINGLE_BLOCK: Self = Self(6);
    pub const SINGLE_WORD: Self = Self(8);
    pub const RAW_LINE: Self = Self(13);

    /// Variants tried when nothing else is configured.
    pub const DEFAULT_SEQUENCE: [Self; 4] =
        [Self::SINGLE_BLOCK, Self::SINGLE_COLUMN, Self::SINGLE_WORD, Self::RAW_LINE];

    pub fn new(mode: u8) -> Result<Self, OcrError> {
        if mode <= 13 {
            Ok(Self(mode))
        } else {
            Err(OcrError::InvalidPageSegMode(mode))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PageSegMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "psm {}", self.0)
    }
}

/// Abstraction over an OCR backend.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8], mode: PageSegMode) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, image_bytes: &[u8], mode: PageSegMode) -> Result<String, OcrError> {
        (**self).recognize(image_bytes, mode)
    }
}

/// Text chosen from a multi-variant recognition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub text: String,
    pub mode: PageSegMode,
    pub line_count: usize,
}

pub fn non_blank_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Run every variant and keep the text with the most non-blank lines.
/// Ties go to the earlier variant; failing variants are skipped.
pub fn recognize_best<B: OcrBackend + ?Sized>(
    backend: &B,
    image_bytes: &[u8],
    modes: &[PageSegMode],
) -> Result<Recognition, OcrError> {
    let mut best: Option<Recognition> = None;
    let mut last_error = None;
    let mut any_succeeded = false;

    for &mode in modes {
        match backend.recognize(image_bytes, mode) {
            Ok(text) => {
                any_succeeded = true;
                let line_count = non_blank_lines(&text);
                debug!(%mode, line_count, "recognition variant finished");
                if line_count > best.as_ref().map_or(0, |b| b.line_count) {
                    best = Some(Recognition { text, mode, line_count });
                }
            }
            Err(e) => {
                debug!(%mode, error = %e, "recognition variant failed");
                last_error = Some(e);
            }
        }
    }

    match (best, last_error) {
        (Some(recognition), _) => Ok(recognition),
        (None, Some(e)) if !any_succeeded => Err(e),
        _ => Err(OcrError::NoText),
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns preset text, optionally different per mode, so the extraction
/// pipeline can be tested without Tesseract installed.
pub struct MockRecognizer {
    text: String,
    per_mode: HashMap<PageSegMode, Option<String>>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), per_mode: HashMap::new() }
    }

    pub fn with_mode(mut self, mode: PageSegMode, text: impl Into<String>) -> Self {
        self.per_mode.insert(mode, Some(text.into()));
        self
    }

    pub fn failing_mode(mut self, mode: PageSegMode) -> Self {
        self.per_mode.insert(mode, None);
        self
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8], mode: PageSegMode) -> Result<String, OcrError> {
        match self.per_mode.get(&mode) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(OcrError::Engine(format!("mock failure for {mode}"))),
            None => Ok(self.text.clone()),
        }
    }
}

/// Stand-in used when the binary is built without an OCR engine.
pub struct UnavailableRecognizer;

impl OcrBackend for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8], _mode: PageSegMode) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

/// Tesseract when compiled in, otherwise a backend that always reports
/// [`OcrError::NotAvailable`].
#[cfg(feature = "tesseract")]
pub fn backend_from_config(config: &OcrConfig) -> Box<dyn OcrBackend> {
    Box::new(tesseract_backend::TesseractRecognizer::new(config.data_path.clone(), &config.language))
}

#[cfg(not(feature = "tesseract"))]
pub fn backend_from_config(_config: &OcrConfig) -> Box<dyn OcrBackend> {
    Box::new(UnavailableRecognizer)
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, PageSegMode};
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8], mode: PageSegMode) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditPagesegMode, &mode.value().to_string())
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
