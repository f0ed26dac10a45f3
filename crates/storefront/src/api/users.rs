//! User listing endpoints for the admin consoles.

use reqwest::Method;
use tracing::instrument;

use nexus_core::{Token, User};

use super::{ApiClient, ApiError, MaybeWrapped};

impl ApiClient {
    /// Fetch every account in the system (super-admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks the role or the request fails.
    #[instrument(skip(self, token))]
    pub async fn all_users(&self, token: &Token) -> Result<Vec<User>, ApiError> {
        let payload: MaybeWrapped<Vec<User>> = self
            .execute(self.request(Method::GET, "/users/all", Some(token)))
            .await?;
        Ok(payload.into_inner())
    }

    /// Fetch shopper accounts only (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks the role or the request fails.
    #[instrument(skip(self, token))]
    pub async fn customers(&self, token: &Token) -> Result<Vec<User>, ApiError> {
        let payload: MaybeWrapped<Vec<User>> = self
            .execute(self.request(Method::GET, "/users/customers", Some(token)))
            .await?;
        Ok(payload.into_inner())
    }
}
