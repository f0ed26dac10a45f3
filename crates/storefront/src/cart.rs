//! Cart store: local cart state synchronized with the remote cart service.
//!
//! One [`CartStore`] lives in the application state; it keeps a per-shopper
//! entry of the last known cart lines. Mutations follow the original
//! client's policies: `add` re-fetches the authoritative cart (the server
//! may merge lines), while `remove` and `update_quantity` patch the local
//! copy speculatively after the server accepted the write.
//!
//! Speculative patches are revision-guarded: every authoritative fetch bumps
//! the entry's revision, and a patch based on an older revision is dropped.
//! Without the guard, a slow mutation response could overwrite a newer
//! fetch (there is no request cancellation - superseded calls still
//! complete).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use nexus_core::{CartItem, CartItemId, Product, Token, User, UserId};

use crate::api::{ApiClient, ApiError};
use crate::session::SessionState;

/// Errors surfaced by cart operations.
///
/// The display strings are user-facing notification text.
#[derive(Debug, Error)]
pub enum CartError {
    /// Operation requires a logged-in session.
    #[error("Please login to add items to cart")]
    NotAuthenticated,

    /// The product snapshot shows no stock; blocked before dispatch.
    #[error("Item is out of stock!")]
    OutOfStock,

    /// The requested quantity exceeds the snapshot's stock; blocked before
    /// dispatch.
    #[error("Only {available} units available in stock")]
    InsufficientStock {
        /// Units available per the local snapshot.
        available: i64,
    },

    /// The backend rejected the operation or was unreachable.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Local cart lines for one shopper.
#[derive(Debug, Default)]
struct CartEntry {
    items: Vec<CartItem>,
    /// Bumped on every authoritative fetch; speculative patches carry the
    /// revision they were based on and are dropped when it no longer
    /// matches.
    revision: u64,
}

impl CartEntry {
    fn replace(&mut self, items: Vec<CartItem>) {
        self.items = items;
        self.revision += 1;
    }

    /// Apply a speculative removal. Returns false if a newer fetch landed
    /// since the mutation was issued.
    fn apply_remove(&mut self, base_revision: u64, item_id: &CartItemId) -> bool {
        if self.revision != base_revision {
            return false;
        }
        self.items.retain(|item| &item.id != item_id);
        true
    }

    /// Apply a speculative quantity patch. Returns false if a newer fetch
    /// landed since the mutation was issued.
    fn apply_quantity(&mut self, base_revision: u64, item_id: &CartItemId, quantity: u32) -> bool {
        if self.revision != base_revision {
            return false;
        }
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == item_id) {
            item.quantity = quantity;
        }
        true
    }
}

/// Shared cart state for all shopper sessions of this process.
///
/// Constructed once at application start and injected through the
/// application state; never torn down. Non-empty only for authenticated
/// shopper sessions - any other session reads an empty cart and clears its
/// entry.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: ApiClient,
    entries: RwLock<HashMap<UserId, CartEntry>>,
}

/// The cart guard: only an authenticated shopper owns cart state.
fn shopper(auth: &SessionState) -> Option<(&Token, &User)> {
    match auth {
        SessionState::Authenticated { token, user } if user.role.is_shopper() => {
            Some((token, user))
        }
        _ => None,
    }
}

impl CartStore {
    /// Create the store around the gateway client.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                entries: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Replace the local lines with the server's authoritative cart.
    ///
    /// Guarded: for anything but an authenticated shopper this clears the
    /// local entry and returns empty without touching the network. On a
    /// fetch failure the previous lines are kept (no empty-cart flash) and
    /// the error is only logged.
    pub async fn fetch(&self, auth: &SessionState) -> Vec<CartItem> {
        let Some((token, user)) = shopper(auth) else {
            if let Some(user) = auth.user() {
                self.clear(&user.id).await;
            }
            return Vec::new();
        };

        match self.inner.api.cart(token).await {
            Ok(items) => {
                let mut entries = self.inner.entries.write().await;
                let entry = entries.entry(user.id.clone()).or_default();
                entry.replace(items);
                entry.items.clone()
            }
            Err(e) => {
                warn!("Failed to fetch cart: {e}");
                self.local_items(&user.id).await
            }
        }
    }

    /// Bring the local entry in line with the session's `(authenticated,
    /// role)` identity, fetching only when it changed - the store's one
    /// reactive dependency. Returns the current lines.
    pub async fn sync(&self, auth: &SessionState) -> Vec<CartItem> {
        let Some((_, user)) = shopper(auth) else {
            if let Some(user) = auth.user() {
                self.clear(&user.id).await;
            }
            return Vec::new();
        };

        let already_synced = self.inner.entries.read().await.contains_key(&user.id);
        if already_synced {
            self.local_items(&user.id).await
        } else {
            self.fetch(auth).await
        }
    }

    /// Current local lines without any network traffic.
    pub async fn items(&self, auth: &SessionState) -> Vec<CartItem> {
        match shopper(auth) {
            Some((_, user)) => self.local_items(&user.id).await,
            None => Vec::new(),
        }
    }

    /// Total units across all lines (navbar badge).
    pub async fn quantity_total(&self, auth: &SessionState) -> u32 {
        self.items(auth)
            .await
            .iter()
            .map(|item| item.quantity)
            .sum()
    }

    /// Add a product to the cart, then re-fetch the authoritative cart
    /// (the server may have merged the addition into an existing line).
    ///
    /// # Errors
    ///
    /// Fails fast without dispatch when the session is not authenticated or
    /// the product snapshot shows no stock; otherwise surfaces the backend
    /// rejection. Local state is unchanged on failure.
    pub async fn add(
        &self,
        auth: &SessionState,
        product: &Product,
        quantity: u32,
    ) -> Result<(), CartError> {
        let SessionState::Authenticated { token, .. } = auth else {
            return Err(CartError::NotAuthenticated);
        };

        if !product.in_stock() {
            return Err(CartError::OutOfStock);
        }

        self.inner
            .api
            .add_to_cart(token, &product.id, quantity)
            .await?;

        // Authoritative merged cart
        self.fetch(auth).await;
        Ok(())
    }

    /// Remove a cart line. On success the line is deleted locally - the
    /// deletion already happened server-side, no re-fetch needed.
    ///
    /// # Errors
    ///
    /// Surfaces the backend rejection; local state is unchanged on failure.
    pub async fn remove(
        &self,
        auth: &SessionState,
        item_id: &CartItemId,
    ) -> Result<(), CartError> {
        let SessionState::Authenticated { token, user } = auth else {
            return Err(CartError::NotAuthenticated);
        };

        let base_revision = self.revision(&user.id).await;
        self.inner.api.remove_cart_item(token, item_id).await?;

        let mut entries = self.inner.entries.write().await;
        if let Some(entry) = entries.get_mut(&user.id)
            && !entry.apply_remove(base_revision, item_id)
        {
            warn!("Dropping stale cart removal patch for item {item_id}");
        }
        Ok(())
    }

    /// Set a line's quantity. A quantity below 1 is rejected locally as a
    /// silent no-op - no network call, no error. On success only that
    /// line's quantity is patched locally, trusting the server accepted the
    /// exact value.
    ///
    /// # Errors
    ///
    /// Fails fast when the requested quantity exceeds the snapshot's stock;
    /// otherwise surfaces the backend rejection. Local state is unchanged
    /// on failure.
    pub async fn update_quantity(
        &self,
        auth: &SessionState,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Ok(());
        }

        let SessionState::Authenticated { token, user } = auth else {
            return Err(CartError::NotAuthenticated);
        };

        let base_revision = {
            let entries = self.inner.entries.read().await;
            let entry = entries.get(&user.id);

            if let Some(item) = entry.and_then(|e| e.items.iter().find(|i| &i.id == item_id))
                && i64::from(quantity) > item.product.stock
            {
                return Err(CartError::InsufficientStock {
                    available: item.product.stock,
                });
            }

            entry.map_or(0, |e| e.revision)
        };

        self.inner
            .api
            .update_cart_item(token, item_id, quantity)
            .await?;

        let mut entries = self.inner.entries.write().await;
        if let Some(entry) = entries.get_mut(&user.id)
            && !entry.apply_quantity(base_revision, item_id, quantity)
        {
            warn!("Dropping stale cart quantity patch for item {item_id}");
        }
        Ok(())
    }

    /// Local-only reset of one shopper's entry. No server call - used for
    /// UI resets (logout, role change), not authoritative deletion.
    pub async fn clear(&self, user_id: &UserId) {
        self.inner.entries.write().await.remove(user_id);
    }

    async fn local_items(&self, user_id: &UserId) -> Vec<CartItem> {
        self.inner
            .entries
            .read()
            .await
            .get(user_id)
            .map(|entry| entry.items.clone())
            .unwrap_or_default()
    }

    async fn revision(&self, user_id: &UserId) -> u64 {
        self.inner
            .entries
            .read()
            .await
            .get(user_id)
            .map_or(0, |entry| entry.revision)
    }
}
