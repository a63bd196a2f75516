//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROCKETSHOES_API_URL` - Base URL of the stock and catalog API
//!
//! ## Optional
//! - `ROCKETSHOES_API_TOKEN` - Bearer token for the stock and catalog API
//! - `ROCKETSHOES_API_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ROCKETSHOES_CART_PATH` - Blob file holding the persisted cart (default: .rocketshoes/cart.json)
//! - `ROCKETSHOES_CART_KEY` - Key of the cart inside the blob file (default: cart)
//! - `ROCKETSHOES_HOST` - Bind address (default: 127.0.0.1)
//! - `ROCKETSHOES_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CART_PATH: &str = ".rocketshoes/cart.json";

/// Key under which the cart blob is stored by default.
pub const DEFAULT_CART_KEY: &str = "cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Stock and catalog API configuration
    pub api: ApiConfig,
    /// Persisted cart location
    pub cart: CartStorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Stock and catalog API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; `stock/{id}` and `products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Where the cart blob lives.
#[derive(Debug, Clone)]
pub struct CartStorageConfig {
    /// Blob file path
    pub path: PathBuf,
    /// Key of the cart inside the blob file
    pub key: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ROCKETSHOES_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ROCKETSHOES_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("ROCKETSHOES_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ROCKETSHOES_PORT".to_string(), e.to_string())
            })?;

        Ok(Self {
            host,
            port,
            api: ApiConfig::from_env()?,
            cart: CartStorageConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ApiConfig {
    /// API configuration with no token and the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load API configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or unusable, the
    /// timeout is not a number, or the token is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url(&get_required_env("ROCKETSHOES_API_URL")?)?;
        Self::from_env_with_base_url(base_url)
    }

    /// Load token and timeout from the environment around an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the timeout is not a number or the token is
    /// set but empty.
    pub fn from_env_with_base_url(base_url: Url) -> Result<Self, ConfigError> {
        let token = get_optional_env("ROCKETSHOES_API_TOKEN")
            .map(|value| parse_api_token(&value))
            .transpose()?;
        let timeout_secs = get_env_or_default(
            "ROCKETSHOES_API_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ROCKETSHOES_API_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl CartStorageConfig {
    /// Load blob file settings, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            path: PathBuf::from(get_env_or_default("ROCKETSHOES_CART_PATH", DEFAULT_CART_PATH)),
            key: get_env_or_default("ROCKETSHOES_CART_KEY", DEFAULT_CART_KEY),
        }
    }
}

impl Default for CartStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CART_PATH),
            key: DEFAULT_CART_KEY.to_string(),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, requiring an http(s) URL that can carry path segments.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("ROCKETSHOES_API_URL".to_string(), reason);

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be a base".to_string()));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Wrap the API token, which is issued by the API and used as is.
fn parse_api_token(value: &str) -> Result<SecretString, ConfigError> {
    let token = value.trim();
    if token.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "ROCKETSHOES_API_TOKEN".to_string(),
            "token is empty".to_string(),
        ));
    }
    Ok(SecretString::from(token.to_string()))
}
