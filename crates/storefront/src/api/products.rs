//! Catalog endpoints.
//!
//! Reads go through a short-TTL snapshot cache; every mutation invalidates
//! it so the edit forms see their own writes.

use std::sync::Arc;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};

use nexus_core::{Product, ProductId, Token};

use super::{ApiClient, ApiError, MaybeWrapped};

const CATALOG_KEY: &str = "products";

/// An image file attached to a product create/update form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fields for creating or updating a product.
///
/// When `image` is present the request is sent as multipart form data (the
/// backend stores the file and fills in the image URL itself); otherwise a
/// JSON body carrying `image_url` as-is.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub image: Option<ImageUpload>,
}

/// JSON body shape for image-less product mutations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductBody<'a> {
    name: &'a str,
    description: &'a str,
    price: &'a Decimal,
    stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

impl ProductDraft {
    fn json_body(&self) -> ProductBody<'_> {
        ProductBody {
            name: &self.name,
            description: &self.description,
            price: &self.price,
            stock: self.stock,
            category: self.category.as_deref(),
            image_url: self.image_url.as_deref(),
        }
    }

    fn multipart_form(&self, image: &ImageUpload) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name.clone())
            .text("description", self.description.clone())
            .text("price", self.price.to_string())
            .text("stock", self.stock.to_string());

        if let Some(category) = &self.category {
            form = form.text("category", category.clone());
        }

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(&image.content_type)?;

        Ok(form.part("imageUrl", part))
    }
}

impl ApiClient {
    /// Fetch the product catalog.
    ///
    /// The result is a shared snapshot; it may be up to a minute stale
    /// unless a mutation invalidated it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. Cached snapshots are served
    /// without touching the network.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(snapshot) = self.catalog_cache().get(&CATALOG_KEY).await {
            debug!("Catalog cache hit");
            return Ok(snapshot);
        }

        let payload: MaybeWrapped<Vec<Product>> = self
            .execute(self.request(Method::GET, "/products", None))
            .await?;
        let snapshot = Arc::new(payload.into_inner());

        self.catalog_cache()
            .insert(CATALOG_KEY, Arc::clone(&snapshot))
            .await;

        Ok(snapshot)
    }

    /// Create a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the draft or the request
    /// fails.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(&self, token: &Token, draft: &ProductDraft) -> Result<(), ApiError> {
        let request = self.request(Method::POST, "/products", Some(token));
        let request = match &draft.image {
            Some(image) => request.multipart(draft.multipart_form(image)?),
            None => request.json(&draft.json_body()),
        };

        self.execute_ok(request).await?;
        self.catalog_cache().invalidate(&CATALOG_KEY).await;
        Ok(())
    }

    /// Update a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the draft or the request
    /// fails.
    #[instrument(skip(self, token, draft), fields(id = %id))]
    pub async fn update_product(
        &self,
        token: &Token,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), ApiError> {
        let path = format!("/products/{id}");
        let request = self.request(Method::PUT, &path, Some(token));
        let request = match &draft.image {
            Some(image) => request.multipart(draft.multipart_form(image)?),
            None => request.json(&draft.json_body()),
        };

        self.execute_ok(request).await?;
        self.catalog_cache().invalidate(&CATALOG_KEY).await;
        Ok(())
    }

    /// Delete a catalog product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or the request
    /// fails.
    #[instrument(skip(self, token), fields(id = %id))]
    pub async fn delete_product(&self, token: &Token, id: &ProductId) -> Result<(), ApiError> {
        let path = format!("/products/{id}");
        self.execute_ok(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        self.catalog_cache().invalidate(&CATALOG_KEY).await;
        Ok(())
    }
}
