pub mod config;
pub mod item;
pub mod money;

pub use config::{
    Config, ConfigError, ExtractionConfig, ExtractionEngine, LlmConfig, OcrConfig,
    ServerConfig,
};
pub use item::{total, ParsedLine, ReceiptItem};
pub use money::Money;
