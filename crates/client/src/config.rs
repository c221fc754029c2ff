//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BIBLIO_STORE_BASE_URL` - Base URL of the store API (carts, products, orders, users)
//!
//! ## Optional
//! - `BIBLIO_AUTH_BASE_URL` - Base URL of the auth API (default: store URL)
//! - `BIBLIO_API_TOKEN` - Bearer token to use when no session is stored
//! - `BIBLIO_STATE_DIR` - Directory for the cart pointer and session files (default: .biblio)
//! - `BIBLIO_HTTP_TIMEOUT_SECS` - Connect/read timeout for every request (default: 30)
//! - `BIBLIO_MAX_UNVALIDATED_CART_USES` - How many times in a row a stored cart id
//!   is trusted while the backend returns no carts (default: 3)
//! - `BIBLIO_PRODUCT_CACHE_TTL_SECS` - Catalogue listing cache TTL (default: 300)
//! - `BIBLIO_LOG_FORMAT` - `text` or `json` (default: text)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STATE_DIR: &str = ".biblio";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";
const DEFAULT_MAX_UNVALIDATED_CART_USES: &str = "3";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Biblio client configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Store API base URL (always ends with `/`)
    pub store_base_url: Url,
    /// Auth API base URL (always ends with `/`)
    pub auth_base_url: Url,
    /// Fallback bearer token when no session is stored
    pub api_token: Option<SecretString>,
    /// Directory holding local state files
    pub state_dir: PathBuf,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Consecutive unvalidated uses of a stored cart id before it is dropped
    pub max_unvalidated_cart_uses: u32,
    /// TTL for cached catalogue listings
    pub product_cache_ttl: Duration,
    /// Log output format
    pub log_format: LogFormat,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("store_base_url", &self.store_base_url.as_str())
            .field("auth_base_url", &self.auth_base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("state_dir", &self.state_dir)
            .field("http_timeout", &self.http_timeout)
            .field("max_unvalidated_cart_uses", &self.max_unvalidated_cart_uses)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ClientConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_base_url = parse_base_url(
            "BIBLIO_STORE_BASE_URL",
            &lookup("BIBLIO_STORE_BASE_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("BIBLIO_STORE_BASE_URL".to_string()))?,
        )?;
        let auth_base_url = match lookup("BIBLIO_AUTH_BASE_URL") {
            Some(raw) => parse_base_url("BIBLIO_AUTH_BASE_URL", &raw)?,
            None => store_base_url.clone(),
        };

        let api_token = lookup("BIBLIO_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);
        let state_dir = PathBuf::from(
            lookup("BIBLIO_STATE_DIR").unwrap_or_else(|| DEFAULT_STATE_DIR.to_string()),
        );

        let http_timeout = Duration::from_secs(parse_number(
            "BIBLIO_HTTP_TIMEOUT_SECS",
            &lookup("BIBLIO_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|| DEFAULT_HTTP_TIMEOUT_SECS.to_string()),
        )?);
        let max_unvalidated_cart_uses = parse_number(
            "BIBLIO_MAX_UNVALIDATED_CART_USES",
            &lookup("BIBLIO_MAX_UNVALIDATED_CART_USES")
                .unwrap_or_else(|| DEFAULT_MAX_UNVALIDATED_CART_USES.to_string()),
        )?;
        let product_cache_ttl = Duration::from_secs(parse_number(
            "BIBLIO_PRODUCT_CACHE_TTL_SECS",
            &lookup("BIBLIO_PRODUCT_CACHE_TTL_SECS")
                .unwrap_or_else(|| DEFAULT_PRODUCT_CACHE_TTL_SECS.to_string()),
        )?);

        let log_format = match lookup("BIBLIO_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("" | "text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "BIBLIO_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            store_base_url,
            auth_base_url,
            api_token,
            state_dir,
            http_timeout,
            max_unvalidated_cart_uses,
            product_cache_ttl,
            log_format,
        })
    }

    /// Path of the file holding the cart pointer.
    #[must_use]
    pub fn cart_pointer_path(&self) -> PathBuf {
        self.state_dir.join("cart_prefs.json")
    }

    /// Path of the file holding the auth session.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, forcing a trailing slash so relative joins append.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse an unsigned integer variable.
fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_store_url() {
        let result = ClientConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref k)) if k == "BIBLIO_STORE_BASE_URL"));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[(
            "BIBLIO_STORE_BASE_URL",
            "https://api.biblio.test/api:store",
        )]))
        .unwrap();

        assert_eq!(
            config.store_base_url.as_str(),
            "https://api.biblio.test/api:store/"
        );
        assert_eq!(config.auth_base_url, config.store_base_url);
        assert!(config.api_token.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.max_unvalidated_cart_uses, 3);
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(
            config.cart_pointer_path(),
            PathBuf::from(".biblio/cart_prefs.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BIBLIO_STORE_BASE_URL", "https://api.biblio.test/store/"),
            ("BIBLIO_AUTH_BASE_URL", "https://api.biblio.test/auth"),
            ("BIBLIO_API_TOKEN", "tok_123"),
            ("BIBLIO_STATE_DIR", "/tmp/biblio"),
            ("BIBLIO_HTTP_TIMEOUT_SECS", "5"),
            ("BIBLIO_MAX_UNVALIDATED_CART_USES", "0"),
            ("BIBLIO_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.auth_base_url.as_str(), "https://api.biblio.test/auth/");
        assert_eq!(config.api_token.as_ref().unwrap().expose_secret(), "tok_123");
        assert_eq!(config.session_path(), PathBuf::from("/tmp/biblio/session.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.max_unvalidated_cart_uses, 0);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values() {
        let bad_url = ClientConfig::from_lookup(lookup(&[("BIBLIO_STORE_BASE_URL", "ftp://x")]));
        assert!(matches!(bad_url, Err(ConfigError::InvalidEnvVar(_, _))));

        let bad_timeout = ClientConfig::from_lookup(lookup(&[
            ("BIBLIO_STORE_BASE_URL", "https://api.biblio.test"),
            ("BIBLIO_HTTP_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "BIBLIO_HTTP_TIMEOUT_SECS"));

        let bad_format = ClientConfig::from_lookup(lookup(&[
            ("BIBLIO_STORE_BASE_URL", "https://api.biblio.test"),
            ("BIBLIO_LOG_FORMAT", "xml"),
        ]));
        assert!(bad_format.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BIBLIO_STORE_BASE_URL", "https://api.biblio.test"),
            ("BIBLIO_API_TOKEN", "super_secret_token_value"),
        ]))
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("api.biblio.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_value"));
    }
}
