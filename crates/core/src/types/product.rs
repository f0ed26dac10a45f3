//! Catalog product model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A catalog product.
///
/// Owned by the backend catalog; the client holds a last-fetched snapshot
/// used for display and edit forms, with no freshness guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Unit price. Sequelize serializes DECIMAL columns as strings.
    pub price: Decimal,
    /// Units available.
    pub stock: i64,
    /// Image location, relative to the backend or absolute.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Optional category used by the catalog filter.
    #[serde(default)]
    pub category: Option<String>,
}

impl Product {
    /// Whether the product can currently be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}
