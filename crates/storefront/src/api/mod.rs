//! Backend API gateway client.
//!
//! The single integration point to the external Nexus backend. Every other
//! component performs network I/O exclusively through [`ApiClient`]; the
//! client attaches the session's bearer token when one is supplied and
//! surfaces failures immediately - there is no retry policy. Callers decide
//! the user-facing behavior (usually a flash notification).
//!
//! # Example
//!
//! ```rust,ignore
//! use nexus_storefront::api::{ApiClient, Credentials};
//!
//! let api = ApiClient::new("http://localhost:5000/api");
//! let payload = api.login(&Credentials {
//!     email: "ada@example.com".into(),
//!     password: "hunter2!".into(),
//! }).await?;
//! let cart = api.cart(&payload.token).await?;
//! ```

mod auth;
mod cart;
mod products;
mod users;

pub use auth::{AuthPayload, Credentials, NewAccount};
pub use products::{ImageUpload, ProductDraft};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use nexus_core::{Product, Token};

/// How long a fetched catalog snapshot is served before hitting the backend
/// again. Catalog mutations invalidate the snapshot early.
const CATALOG_TTL: Duration = Duration::from_secs(60);

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("could not reach the server")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the request with a non-2xx status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// A 2xx response body did not match the expected shape.
    #[error("unexpected response from the server")]
    Decode(String),
}

impl ApiError {
    /// Whether the backend explicitly rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }
}

/// Client for the Nexus backend API.
///
/// Cheaply cloneable via `Arc`. Catalog reads are cached for a short TTL;
/// cart and user data are never cached (mutable state).
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    catalog: Cache<&'static str, Arc<Vec<Product>>>,
}

impl ApiClient {
    /// Create a new API client for the given base URL (e.g.
    /// `http://localhost:5000/api`). A trailing slash is stripped.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let catalog = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATALOG_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_owned(),
                catalog,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Start a request, attaching `Authorization: Bearer <token>` when a
    /// token is present. The client never validates or refreshes the token.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&Token>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.inner.http.request(method, self.url(path));
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        builder
    }

    /// Execute a request and decode the JSON response body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics.
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to decode backend response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// Execute a request, checking only the status code.
    ///
    /// Used for mutations whose response body carries nothing the client
    /// needs (the authoritative state is re-fetched or patched separately).
    pub(crate) async fn execute_ok(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }

        Ok(())
    }

    pub(crate) fn catalog_cache(&self) -> &Cache<&'static str, Arc<Vec<Product>>> {
        &self.inner.catalog
    }

    /// Whether the backend is reachable at all. Any HTTP response counts;
    /// only a transport failure does not.
    pub async fn ping(&self) -> bool {
        self.inner
            .http
            .get(self.url("/products"))
            .send()
            .await
            .is_ok()
    }
}

// =============================================================================
// Response envelopes
// =============================================================================

/// The backend is inconsistent about enveloping: some endpoints return
/// `{ "data": ... }`, others the bare value. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum MaybeWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> MaybeWrapped<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// The backend uses both `{"message": ...}` and `{"error": ...}` shapes;
/// anything else falls back to a generic status-based message.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(|m| m.as_str()) {
                return message.to_owned();
            }
        }
    }

    match status {
        401 => "Please login to continue".to_owned(),
        403 => "You are not allowed to do that".to_owned(),
        404 => "Not found".to_owned(),
        _ => format!("Request failed with status {status}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_message_key() {
        let msg = error_message(400, r#"{"message": "Invalid email or password"}"#);
        assert_eq!(msg, "Invalid email or password");
    }

    #[test]
    fn test_error_message_from_error_key() {
        let msg = error_message(409, r#"{"error": "Email already registered"}"#);
        assert_eq!(msg, "Email already registered");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(401, "nope"), "Please login to continue");
        assert_eq!(
            error_message(500, "<html>Internal Server Error</html>"),
            "Request failed with status 500"
        );
    }

    #[test]
    fn test_maybe_wrapped_accepts_both_shapes() {
        let wrapped: MaybeWrapped<Vec<u32>> = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);

        let bare: MaybeWrapped<Vec<u32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(bare.into_inner(), vec![3]);
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let api = ApiClient::new("http://localhost:5000/api/");
        assert_eq!(api.url("/products"), "http://localhost:5000/api/products");
    }

    #[test]
    fn test_is_unauthorized() {
        let err = ApiError::Http {
            status: 401,
            message: String::new(),
        };
        assert!(err.is_unauthorized());

        let err = ApiError::Http {
            status: 400,
            message: String::new(),
        };
        assert!(!err.is_unauthorized());
    }
}
