use std::env;

use crate::error::AppError;

/// Engine configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub search: SearchConfig,
    pub signals: SignalConfig,
}

/// REST backend configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token for an already authenticated session.
    pub auth_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

/// Search dispatcher tuning
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum trimmed query length before a remote call is issued.
    pub min_query_len: usize,
    pub debounce_ms: u64,
    /// Page size for the paged strategist lookup.
    pub page_size: u32,
}

/// Signal bus configuration
#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub buffer_capacity: usize,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config {
                message: format!("API_BASE_URL must be an http(s) URL, got '{}'", base_url),
            });
        }

        let api = ApiConfig {
            base_url,
            auth_token: env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_env("REQUEST_TIMEOUT_MS").unwrap_or(10000),
        };

        let defaults = SearchConfig::default();
        let search = SearchConfig {
            min_query_len: parse_env("SEARCH_MIN_QUERY_LEN")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.min_query_len),
            debounce_ms: parse_env("SEARCH_DEBOUNCE_MS").unwrap_or(defaults.debounce_ms),
            page_size: parse_env("SEARCH_PAGE_SIZE")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.page_size),
        };

        let signals = SignalConfig {
            buffer_capacity: parse_env("SIGNAL_BUFFER_CAPACITY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or_else(|| SignalConfig::default().buffer_capacity),
        };

        Ok(Config {
            api,
            logging,
            request,
            search,
            signals,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 10000 }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            debounce_ms: 250,
            page_size: 10,
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 64,
        }
    }
}
