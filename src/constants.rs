/// Source and storage constants shared across the codebase

// Source names (used in logs, metrics and history)
pub const OPEN_FOOD_FACTS_SOURCE: &str = "open_food_facts";
pub const TESSERACT_OCR_SOURCE: &str = "tesseract_ocr";
pub const LABEL_TEXT_SOURCE: &str = "label_text";

// Open Food Facts endpoints
pub const OPEN_FOOD_FACTS_BASE_URL: &str = "https://world.openfoodfacts.org";
pub const OPEN_FOOD_FACTS_PRODUCT_PATH: &str = "/api/v0/product";
pub const OPEN_FOOD_FACTS_SEARCH_PATH: &str = "/cgi/search.pl";
pub const DEFAULT_SEARCH_PAGE_SIZE: usize = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("product_health/", env!("CARGO_PKG_VERSION"));

// OCR defaults
pub const DEFAULT_TESSERACT_CMD: &str = "tesseract";
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const DEFAULT_PAGE_SEGMENTATION_MODE: u8 = 6;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

// History and logging defaults
pub const DEFAULT_HISTORY_PATH: &str = "outputs/history.json";
pub const DEFAULT_HISTORY_DISPLAY_LIMIT: usize = 10;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "app.log";

// Environment overrides
pub const ENV_OFF_URL: &str = "PRODUCT_HEALTH_OFF_URL";
pub const ENV_HISTORY_PATH: &str = "PRODUCT_HEALTH_HISTORY_PATH";
pub const ENV_TESSERACT_CMD: &str = "PRODUCT_HEALTH_TESSERACT";
