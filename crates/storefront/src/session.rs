//! Session store: owns the authentication state.
//!
//! The browser session persists exactly two keys - the bearer token and the
//! JSON-serialized account snapshot. [`SessionState`] is a closed sum, so
//! "authenticated" and "token and user both present" are the same thing by
//! construction; a session holding only one of the two keys reads as
//! anonymous and the leftover key is purged.
//!
//! Revalidation (`check_auth`) runs once per process lifetime per
//! credential: a process-wide memo keyed by token records which credentials
//! have already been confirmed against `/users/me`, so ordinary navigation
//! never re-triggers the call.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use moka::future::Cache;
use tower_sessions::Session;
use tracing::warn;

use nexus_core::{Role, Token, User};

use crate::api::ApiClient;

/// Session keys for the persisted credential pair.
pub mod keys {
    /// Key for the opaque bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the JSON-serialized account snapshot.
    pub const USER: &str = "user";
}

/// Process-wide memo of credentials already revalidated this lifetime.
pub type RevalidationMemo = Cache<String, ()>;

/// Build the revalidation memo.
///
/// The capacity bound and idle eviction keep an abandoned-session flood
/// from growing the memo without limit; an evicted credential is simply
/// revalidated one more time.
#[must_use]
pub fn revalidation_memo() -> RevalidationMemo {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_idle(Duration::from_secs(24 * 60 * 60))
        .build()
}

/// The authentication state of one browser session.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// No valid credential pair is persisted.
    Anonymous,
    /// A credential pair is persisted. The user snapshot may be stale until
    /// revalidation replaces it.
    Authenticated {
        /// The opaque bearer token.
        token: Token,
        /// Cached account snapshot.
        user: User,
    },
}

impl SessionState {
    /// Whether a credential pair is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The account snapshot, if authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    /// The bearer token, if authenticated.
    #[must_use]
    pub const fn token(&self) -> Option<&Token> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            Self::Anonymous => None,
        }
    }

    /// The session's role, if authenticated.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    /// Both halves of the credential pair, if authenticated.
    #[must_use]
    pub const fn credentials(&self) -> Option<(&Token, &User)> {
        match self {
            Self::Authenticated { token, user } => Some((token, user)),
            Self::Anonymous => None,
        }
    }
}

/// Handle to the session store for one request.
///
/// Wraps the tower-sessions record and exposes the three state transitions:
/// `login` (replace wholesale), `logout` (clear wholesale, idempotent), and
/// `check_auth` (revalidate-or-logout).
#[derive(Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    /// Wrap a raw session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Read the current state.
    ///
    /// Read failures (missing keys, undecodable values from an older
    /// deployment) degrade to [`SessionState::Anonymous`]; a partial
    /// credential pair is purged so the invariant holds on the next read
    /// too.
    pub async fn state(&self) -> SessionState {
        let token: Option<Token> = self.session.get(keys::TOKEN).await.ok().flatten();
        let user: Option<User> = self.session.get(keys::USER).await.ok().flatten();

        match (token, user) {
            (Some(token), Some(user)) => SessionState::Authenticated { token, user },
            (None, None) => SessionState::Anonymous,
            _ => {
                warn!("Purging partial session credentials");
                if let Err(e) = self.logout().await {
                    warn!("Failed to purge partial session: {e}");
                }
                SessionState::Anonymous
            }
        }
    }

    /// Persist a freshly issued credential pair.
    ///
    /// No server round-trip: the caller just validated the credentials via
    /// the gateway's login call.
    ///
    /// # Errors
    ///
    /// Returns an error if the session record cannot be written.
    pub async fn login(
        &self,
        token: &Token,
        user: &User,
    ) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(keys::TOKEN, token).await?;
        self.session.insert(keys::USER, user).await?;
        Ok(())
    }

    /// Clear the persisted credential pair. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session record cannot be written.
    pub async fn logout(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<Token>(keys::TOKEN).await?;
        self.session.remove::<User>(keys::USER).await?;
        Ok(())
    }

    /// Revalidate the persisted credentials against `/users/me`.
    ///
    /// On success the cached user is replaced with the fresh copy; on any
    /// failure - expired token, network error - the credentials are cleared
    /// and the session lands in the logged-out terminal state. Failures are
    /// absorbed here; rendering never crashes on a dead session.
    ///
    /// The `memo` limits the round-trip to once per process lifetime per
    /// credential.
    pub async fn check_auth(&self, api: &ApiClient, memo: &RevalidationMemo) -> SessionState {
        let state = self.state().await;
        let SessionState::Authenticated { token, user } = state else {
            return SessionState::Anonymous;
        };

        if memo.get(token.as_str()).await.is_some() {
            return SessionState::Authenticated { token, user };
        }

        match api.me(&token).await {
            Ok(fresh) => {
                if let Err(e) = self.session.insert(keys::USER, &fresh).await {
                    warn!("Failed to refresh session user: {e}");
                }
                memo.insert(token.as_str().to_owned(), ()).await;
                SessionState::Authenticated { token, user: fresh }
            }
            Err(e) => {
                warn!("Session revalidation failed, logging out: {e}");
                if let Err(e) = self.logout().await {
                    warn!("Failed to clear session after revalidation: {e}");
                }
                SessionState::Anonymous
            }
        }
    }
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "session layer missing"))
    }
}
