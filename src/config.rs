use crate::constants::*;
use crate::error::{LookupError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub open_food_facts: OpenFoodFactsConfig,
    pub ocr: OcrConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenFoodFactsConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub page_size: usize,
    pub user_agent: String,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: OPEN_FOOD_FACTS_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            page_size: DEFAULT_SEARCH_PAGE_SIZE,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub tesseract_cmd: String,
    pub language: String,
    pub page_segmentation_mode: u8,
    pub download_timeout_seconds: u64,
    /// Largest image accepted from a URL or local file
    pub max_image_bytes: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: DEFAULT_TESSERACT_CMD.to_string(),
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            page_segmentation_mode: DEFAULT_PAGE_SEGMENTATION_MODE,
            download_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: String,
    pub display_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_HISTORY_PATH.to_string(),
            display_limit: DEFAULT_HISTORY_DISPLAY_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_LOG_DIR.to_string(),
            file_prefix: DEFAULT_LOG_FILE_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults;
    /// environment overrides are applied either way.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                LookupError::Config(format!("Failed to read config file '{}': {}", path, e))
            })?;
            Self::from_toml_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env(ENV_OFF_URL) {
            self.open_food_facts.base_url = url;
        }
        if let Some(path) = non_empty_env(ENV_HISTORY_PATH) {
            self.history.path = path;
        }
        if let Some(cmd) = non_empty_env(ENV_TESSERACT_CMD) {
            self.ocr.tesseract_cmd = cmd;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.open_food_facts.page_size == 0 {
            return Err(LookupError::Config(
                "open_food_facts.page_size must be at least 1".to_string(),
            ));
        }
        if self.ocr.max_image_bytes == 0 {
            return Err(LookupError::Config(
                "ocr.max_image_bytes must be at least 1".to_string(),
            ));
        }
        if self.open_food_facts.base_url.trim().is_empty() {
            return Err(LookupError::Config(
                "open_food_facts.base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}
