// Source discovery
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_FILE_PREFIX: &str = "trendlyne-filtered";
pub const DEFAULT_DIRECTORY_FILE: &str = "nifty_stocks.csv";

// Tokens treated as an empty cell, compared case-insensitively
pub const PLACEHOLDER_TOKENS: &[&str] = &["n/a", "na", "none", "null"];

// Identity key prefixes
pub const ISIN_KEY_PREFIX: &str = "ISIN";
pub const NSE_KEY_PREFIX: &str = "NSE";

// Composite index presets for the durability/valuation endpoints
pub const DEFAULT_MIN_DURABILITY: i64 = 70;
pub const DEFAULT_MIN_VALUATION: i64 = 50;
pub const EXCELLENT_MIN_DURABILITY: i64 = 80;
pub const EXCELLENT_MIN_VALUATION: i64 = 53;

// Request limits
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 100;
pub const DEFAULT_SCREEN_LIMIT: usize = 50;
pub const MAX_SCREEN_LIMIT: usize = 500;

// Number of row-level problems logged individually before only counting
pub const ROW_WARNING_LOG_LIMIT: usize = 3;

pub const SERVICE_NAME: &str = "quality-screener";
