//! Remote cart endpoints.
//!
//! Cart data is never cached here - the cart store decides what to keep
//! locally and when to re-fetch.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use nexus_core::{CartItem, CartItemId, CartItemWithUser, ProductId, Token, UserId};

use super::{ApiClient, ApiError, MaybeWrapped};

#[derive(Serialize)]
struct AddToCartBody<'a> {
    #[serde(rename = "productId")]
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct UpdateQuantityBody {
    quantity: u32,
}

impl ApiClient {
    /// Fetch the calling shopper's own cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or the request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &Token) -> Result<Vec<CartItem>, ApiError> {
        let payload: MaybeWrapped<Vec<CartItem>> = self
            .execute(self.request(Method::GET, "/cart", Some(token)))
            .await?;
        Ok(payload.into_inner())
    }

    /// Fetch a specific user's cart (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks the role or the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn cart_for_user(
        &self,
        token: &Token,
        user_id: &UserId,
    ) -> Result<Vec<CartItem>, ApiError> {
        let path = format!("/cart/{user_id}");
        let payload: MaybeWrapped<Vec<CartItem>> = self
            .execute(self.request(Method::GET, &path, Some(token)))
            .await?;
        Ok(payload.into_inner())
    }

    /// Fetch every cart line in the system with its owning user
    /// (super-admin overview).
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks the role or the request fails.
    #[instrument(skip(self, token))]
    pub async fn all_cart_items(&self, token: &Token) -> Result<Vec<CartItemWithUser>, ApiError> {
        let payload: MaybeWrapped<Vec<CartItemWithUser>> = self
            .execute(self.request(Method::GET, "/cart/all", Some(token)))
            .await?;
        Ok(payload.into_inner())
    }

    /// Add a product to the calling shopper's cart.
    ///
    /// The server may merge the addition into an existing line of the same
    /// product, so callers re-fetch the cart for the authoritative result.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the addition or the request
    /// fails.
    #[instrument(skip(self, token), fields(product_id = %product_id, quantity))]
    pub async fn add_to_cart(
        &self,
        token: &Token,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.execute_ok(
            self.request(Method::POST, "/cart/add", Some(token))
                .json(&AddToCartBody {
                    product_id,
                    quantity,
                }),
        )
        .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update or the request
    /// fails.
    #[instrument(skip(self, token), fields(item_id = %item_id, quantity))]
    pub async fn update_cart_item(
        &self,
        token: &Token,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/{item_id}");
        self.execute_ok(
            self.request(Method::PUT, &path, Some(token))
                .json(&UpdateQuantityBody { quantity }),
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal or the request
    /// fails.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &Token,
        item_id: &CartItemId,
    ) -> Result<(), ApiError> {
        let path = format!("/cart/{item_id}");
        self.execute_ok(self.request(Method::DELETE, &path, Some(token)))
            .await
    }
}
