//! Cart page and cart mutation handlers.
//!
//! Every route here is shopper-gated by [`RequireShopper`]; anonymous
//! visitors are redirected to the login page with the cart remembered as
//! the return location.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use nexus_core::{CartItem, CartItemId, ProductId};

use crate::authz::RequireShopper;
use crate::filters;
use crate::state::AppState;

use super::{MessageQuery, Nav, flash_error, flash_success, format_price, image_src};

/// Flat tax rate applied in the order summary.
const TAX_RATE: &str = "0.10";

// =============================================================================
// Form types
// =============================================================================

/// Add-to-cart form data (submitted from the catalog).
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityForm {
    pub item_id: String,
    pub quantity: u32,
}

/// Line removal form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub item_id: String,
}

// =============================================================================
// View types
// =============================================================================

/// Cart line display data.
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub next_quantity: u32,
    pub previous_quantity: u32,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub tax: String,
    pub total: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn build_lines(state: &AppState, items: &[CartItem]) -> Vec<CartLineView> {
    items
        .iter()
        .map(|item| CartLineView {
            id: item.id.to_string(),
            name: item.product.name.clone(),
            unit_price: format_price(&item.product.price),
            quantity: item.quantity,
            next_quantity: item.quantity.saturating_add(1),
            previous_quantity: item.quantity.saturating_sub(1),
            line_total: format_price(&item.line_total()),
            image_url: item
                .product
                .image_url
                .as_deref()
                .map(|raw| image_src(&state.config().backend_url, raw)),
        })
        .collect()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page with the order summary.
pub async fn show(
    State(state): State<AppState>,
    RequireShopper(auth): RequireShopper,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let items = state.carts().sync(&auth).await;
    let nav = Nav::build(&state, &auth).await;

    let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
    let tax_rate: Decimal = TAX_RATE.parse().unwrap_or_default();
    let tax = subtotal * tax_rate;

    CartShowTemplate {
        nav,
        lines: build_lines(&state, &items),
        subtotal: format_price(&subtotal),
        tax: format_price(&tax),
        total: format_price(&(subtotal + tax)),
        error: query.error,
        success: query.success,
    }
}

/// Add a product to the cart, then return to the catalog.
pub async fn add(
    State(state): State<AppState>,
    RequireShopper(auth): RequireShopper,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity.unwrap_or(1);

    // The cart store needs the product snapshot for its stock guard.
    let product = match state.api().products().await {
        Ok(snapshot) => snapshot.iter().find(|p| p.id == product_id).cloned(),
        Err(e) => {
            tracing::warn!("Failed to fetch products for add-to-cart: {e}");
            None
        }
    };

    let Some(product) = product else {
        return flash_error("/", "Product not found").into_response();
    };

    match state.carts().add(&auth, &product, quantity).await {
        Ok(()) => {
            let message = format!("{} added to cart!", product.name);
            flash_success("/", &message).into_response()
        }
        Err(e) => flash_error("/", &e.to_string()).into_response(),
    }
}

/// Set a line's quantity, then return to the cart page.
pub async fn update(
    State(state): State<AppState>,
    RequireShopper(auth): RequireShopper,
    Form(form): Form<UpdateQuantityForm>,
) -> Response {
    let item_id = CartItemId::new(form.item_id);

    match state
        .carts()
        .update_quantity(&auth, &item_id, form.quantity)
        .await
    {
        Ok(()) => Redirect::to("/cart").into_response(),
        Err(e) => flash_error("/cart", &e.to_string()).into_response(),
    }
}

/// Remove a line, then return to the cart page.
pub async fn remove(
    State(state): State<AppState>,
    RequireShopper(auth): RequireShopper,
    Form(form): Form<RemoveForm>,
) -> Response {
    let item_id = CartItemId::new(form.item_id);

    match state.carts().remove(&auth, &item_id).await {
        Ok(()) => flash_success("/cart", "Item removed").into_response(),
        Err(e) => {
            tracing::warn!("Failed to remove cart item: {e}");
            flash_error("/cart", "Failed to remove item").into_response()
        }
    }
}

/// Checkout stub. Payment processing is out of scope; this just confirms
/// the intent.
pub async fn checkout(RequireShopper(_auth): RequireShopper) -> Response {
    flash_success("/cart", "Proceeding to checkout... (Mock)").into_response()
}
