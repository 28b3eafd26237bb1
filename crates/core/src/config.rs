use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level `tillscan.toml`. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    pub extraction: ExtractionConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    pub data_path: Option<String>,
    /// Tesseract page segmentation modes, tried in order; the output with the
    /// most non-blank lines wins.
    pub page_seg_modes: Vec<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: None,
            page_seg_modes: vec![6, 4, 8, 13],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionEngine {
    #[default]
    Regex,
    Llm,
}

impl std::fmt::Display for ExtractionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionEngine::Regex => write!(f, "regex"),
            ExtractionEngine::Llm => write!(f, "llm"),
        }
    }
}

impl std::str::FromStr for ExtractionEngine {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "regex" => Ok(ExtractionEngine::Regex),
            "llm" => Ok(ExtractionEngine::Llm),
            other => Err(format!("Unknown extraction engine: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub engine: ExtractionEngine,
    /// Emit a bare `{name, price}` for unmatched lines that still carry a
    /// two-decimal amount.
    pub fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { engine: ExtractionEngine::Regex, fallback: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address for the upload API.
    pub bind: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:5000".to_string(), max_upload_bytes: 10 * 1024 * 1024 }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind: '{}' is not a socket address", self.bind)))
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ocr.page_seg_modes.is_empty() {
            return Err(ConfigError::Invalid("ocr.page_seg_modes must not be empty".into()));
        }
        if let Some(bad) = self.ocr.page_seg_modes.iter().find(|m| **m > 13) {
            return Err(ConfigError::Invalid(format!(
                "ocr.page_seg_modes: {bad} is not a tesseract page segmentation mode (0-13)"
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid("llm.timeout_secs must be positive".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_upload_bytes must be positive".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}
