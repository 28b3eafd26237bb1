/// Declares a lazily compiled, process-wide regex accessor.
macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod catalog;
pub mod classify;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod recognizer;
pub mod skip;
pub mod summary;

pub use catalog::{Catalog, DecimalSeparator, Template};
pub use classify::{classify_line, LineClassifier};
pub use extract::{ExtractedReceipt, Extractor, LineMatch};
pub use normalize::normalize_price;
pub use pipeline::{OcrResult, PipelineError, ReceiptPipeline};
pub use recognizer::{
    backend_from_config, recognize_best, MockRecognizer, OcrBackend, OcrError, PageSegMode, Recognition,
    UnavailableRecognizer,
};
pub use skip::SkipFilter;
pub use summary::{ReceiptSummary, TotalCheck};
