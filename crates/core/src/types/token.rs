//! Opaque bearer credential.

use serde::{Deserialize, Serialize};

/// An opaque bearer token issued by the backend on login.
///
/// The client never inspects or refreshes it; it is attached verbatim as an
/// `Authorization: Bearer` header. `Debug` redacts the value so tokens do
/// not end up in logs or error reports.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the raw credential for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self(token)
    }
}
