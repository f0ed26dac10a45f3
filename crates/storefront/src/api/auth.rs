//! Authentication endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use nexus_core::{Token, User};

use super::{ApiClient, ApiError, MaybeWrapped};

/// Login form payload.
#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Account creation payload, used for shopper registration and for
/// super-admin provisioning of admin accounts.
#[derive(Debug, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful login response: the bearer token plus the account it belongs
/// to, already validated by the backend.
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub token: Token,
    pub user: User,
}

impl ApiClient {
    /// Create a shopper account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration (for
    /// example, the email is already taken) or the request fails.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<(), ApiError> {
        self.execute_ok(
            self.request(Method::POST, "/auth/register", None)
                .json(account),
        )
        .await
    }

    /// Exchange credentials for a bearer token and the account snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, ApiError> {
        self.execute(
            self.request(Method::POST, "/auth/login", None)
                .json(credentials),
        )
        .await
    }

    /// Provision an admin account (super-admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller is not a super-admin or the request
    /// fails.
    #[instrument(skip(self, token, account), fields(email = %account.email))]
    pub async fn create_admin(&self, token: &Token, account: &NewAccount) -> Result<(), ApiError> {
        self.execute_ok(
            self.request(Method::POST, "/auth/create-admin", Some(token))
                .json(account),
        )
        .await
    }

    /// Fetch the account the token belongs to ("who am I").
    ///
    /// Used for session revalidation; a failure here means the persisted
    /// credentials are no longer valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is expired/invalid or the request
    /// fails.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &Token) -> Result<User, ApiError> {
        let payload: MaybeWrapped<User> = self
            .execute(self.request(Method::GET, "/users/me", Some(token)))
            .await?;
        Ok(payload.into_inner())
    }
}
