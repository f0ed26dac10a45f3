//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NEXUS_BACKEND_URL` - Backend API origin (default: `http://localhost:5000/api`)
//! - `NEXUS_HOST` - Bind address (default: 127.0.0.1)
//! - `NEXUS_PORT` - Listen port (default: 3000)
//! - `NEXUS_BASE_URL` - Public URL of this site (default: `http://localhost:3000`)
//! - `NEXUS_LEGACY_OPEN_ROUTES` - Reproduce the historical disabled role
//!   check: any authenticated session may render any route (default: off)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the backend API, including the `/api` path.
    pub backend_url: String,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL for this site.
    pub base_url: String,
    /// Accept any authenticated role on any protected route (the original
    /// client's disabled authorization check, off by default).
    pub legacy_open_routes: bool,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend_url = get_env_or_default("NEXUS_BACKEND_URL", "http://localhost:5000/api");
        validate_backend_url(&backend_url)?;

        let host = get_env_or_default("NEXUS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("NEXUS_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("NEXUS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("NEXUS_PORT".to_owned(), e.to_string()))?;
        let base_url = get_env_or_default("NEXUS_BASE_URL", "http://localhost:3000");
        let legacy_open_routes = parse_bool(&get_env_or_default("NEXUS_LEGACY_OPEN_ROUTES", "0"));
        let sentry_dsn = std::env::var("SENTRY_DSN").ok();

        Ok(Self {
            backend_url,
            host,
            port,
            base_url,
            legacy_open_routes,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse a boolean flag the way deploy tooling writes them.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Validate that the backend URL is an absolute http(s) URL.
fn validate_backend_url(value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value).map_err(|e| {
        ConfigError::InvalidEnvVar("NEXUS_BACKEND_URL".to_owned(), e.to_string())
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "NEXUS_BACKEND_URL".to_owned(),
            format!("unsupported scheme: {}", parsed.scheme()),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            backend_url: "http://localhost:5000/api".to_owned(),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            legacy_open_routes: false,
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_parse_bool() {
        for truthy in ["1", "true", "TRUE", "yes", "on"] {
            assert!(parse_bool(truthy), "{truthy} should parse as true");
        }
        for falsy in ["0", "false", "off", "", "nope"] {
            assert!(!parse_bool(falsy), "{falsy} should parse as false");
        }
    }

    #[test]
    fn test_validate_backend_url() {
        assert!(validate_backend_url("http://localhost:5000/api").is_ok());
        assert!(validate_backend_url("https://api.example.com/api").is_ok());
        assert!(validate_backend_url("/api").is_err());
        assert!(validate_backend_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://shop.example.com".to_owned();
        assert!(config.is_secure());
    }
}
