//! Domain type definitions.

pub mod cart;
pub mod email;
pub mod id;
pub mod product;
pub mod role;
pub mod token;
pub mod user;

pub use cart::{CartItem, CartItemWithUser};
pub use email::{Email, EmailError};
pub use id::{CartItemId, ProductId, UserId};
pub use product::Product;
pub use role::Role;
pub use token::Token;
pub use user::User;
