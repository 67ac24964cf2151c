//! Client configuration

use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// Environment variable naming the backend base URL, e.g.
/// `"https://api.bodegon.example"`.
pub const API_URL_VAR: &str = "BODEGON_API_URL";

/// Environment variable overriding where the anonymous cart is persisted.
pub const CART_PATH_VAR: &str = "BODEGON_CART_PATH";

/// Environment variable setting the HTTP request timeout, in whole seconds.
pub const HTTP_TIMEOUT_VAR: &str = "BODEGON_HTTP_TIMEOUT_SECS";

const DEFAULT_CART_PATH: &str = ".bodegon/cart.json";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for environment variable {0}")]
    InvalidVar(&'static str),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub base_url: String,

    /// Where the anonymous cart file lives.
    pub cart_path: PathBuf,

    /// Per-request timeout; `None` uses the HTTP client's default.
    pub http_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Builds a configuration directly, for embedding and tests.
    pub fn new(base_url: impl Into<String>, cart_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            cart_path: cart_path.into(),
            http_timeout: None,
        }
    }

    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when [`API_URL_VAR`] is unset or a value cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        let base_url = env::var(API_URL_VAR).map_err(|_| ConfigError::MissingVar(API_URL_VAR))?;

        let cart_path = env::var(CART_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CART_PATH));

        let http_timeout = match env::var(HTTP_TIMEOUT_VAR) {
            Err(_) => None,
            Ok(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidVar(HTTP_TIMEOUT_VAR))?;

                Some(Duration::from_secs(secs))
            }
        };

        Ok(Self {
            base_url,
            cart_path,
            http_timeout,
        })
    }
}
