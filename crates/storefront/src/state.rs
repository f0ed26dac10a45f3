//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::session::{RevalidationMemo, revalidation_memo};

/// Application state shared across all handlers.
///
/// Constructed once at application start and cheaply cloneable via `Arc`.
/// This is the explicit container for everything the original client kept
/// in ambient provider state: the gateway client, the cart store, and the
/// revalidation memo.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    carts: CartStore,
    revalidated: RevalidationMemo,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let api = ApiClient::new(&config.backend_url);
        let carts = CartStore::new(api.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                carts,
                revalidated: revalidation_memo(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the shared cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Get a reference to the session revalidation memo.
    #[must_use]
    pub fn revalidated(&self) -> &RevalidationMemo {
        &self.inner.revalidated
    }
}
