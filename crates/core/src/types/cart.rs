//! Cart line item models.
//!
//! Cart payloads are denormalized: the backend joins the product row into
//! each line item under the `Product` key (and, for the all-carts overview,
//! the owning user under `User`). A cart item existing implies its product
//! snapshot exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::{CartItemId, ProductId};
use crate::types::product::Product;
use crate::types::user::User;

/// A line item in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Unique line item ID.
    pub id: CartItemId,
    /// The product this line refers to.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Units of the product in the cart. Always at least 1.
    pub quantity: u32,
    /// Product snapshot joined by the backend.
    #[serde(rename = "Product")]
    pub product: Product,
}

impl CartItem {
    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A cart line item with its owning user, as returned by the all-carts
/// overview used by the super-admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemWithUser {
    /// Unique line item ID.
    pub id: CartItemId,
    /// Units of the product in the cart.
    pub quantity: u32,
    /// The shopper who owns this line.
    #[serde(rename = "User")]
    pub user: User,
    /// Product snapshot joined by the backend.
    #[serde(rename = "Product")]
    pub product: Product,
}

impl CartItemWithUser {
    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::id::UserId;

    fn widget(price: &str, stock: i64) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Widget".to_owned(),
            description: String::new(),
            price: price.parse().unwrap(),
            stock,
            image_url: None,
            category: None,
        }
    }

    #[test]
    fn test_deserialize_joined_product() {
        let json = r#"{
            "id": "c9",
            "productId": "p1",
            "quantity": 2,
            "Product": {"id": "p1", "name": "Widget", "price": "19.99", "stock": 5}
        }"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, CartItemId::new("c9"));
        assert_eq!(item.product.name, "Widget");
        assert_eq!(item.line_total().to_string(), "39.98");
    }

    #[test]
    fn test_overview_line_total() {
        let item = CartItemWithUser {
            id: CartItemId::new("c1"),
            quantity: 3,
            user: User {
                id: UserId::new("u1"),
                name: "Ada".to_owned(),
                email: "ada@example.com".parse().unwrap(),
                role: crate::Role::User,
            },
            product: widget("4.50", 10),
        };
        assert_eq!(item.line_total().to_string(), "13.50");
    }
}
