//! HTTP route handlers for the storefront and admin consoles.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (substring filter via ?q=)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachability)
//!
//! # Auth
//! GET  /login                  - Login page (?next= remembered location)
//! POST /login                  - Login action
//! GET  /register               - Registration page
//! POST /register               - Registration action
//! POST /logout                 - Logout action
//!
//! # Cart (shoppers only)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a product (re-fetches the cart)
//! POST /cart/update            - Set a line quantity (speculative patch)
//! POST /cart/remove            - Remove a line (speculative patch)
//! POST /cart/checkout          - Checkout stub
//!
//! # Admin console (admins only)
//! GET  /admin                  - Dashboard (?tab=users|products)
//! GET  /admin/carts/{id}       - A customer's live cart
//! GET  /admin/products/new     - Product form
//! GET  /admin/products/{id}/edit - Product form
//! POST /admin/products         - Create product
//! POST /admin/products/{id}    - Update product
//! POST /admin/products/{id}/delete - Delete product (super-admin only)
//!
//! # Super-admin console (super-admins only)
//! GET  /superadmin             - Dashboard (?tab=users|products|carts)
//! POST /superadmin/admins      - Provision an admin account
//! GET/POST /superadmin/products... - Same product management as /admin
//! ```
//!
//! Feedback that the original client showed as toasts travels as `error` /
//! `success` query parameters on redirects.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod superadmin;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use nexus_core::Role;

use crate::middleware::{create_session_layer, request_id_middleware, revalidate_session};
use crate::session::SessionState;
use crate::state::AppState;

/// Flash message query parameters.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Shared view data
// =============================================================================

/// Data for the site-wide navigation bar.
pub struct Nav {
    pub user: Option<NavUser>,
    pub cart_count: u32,
}

/// The logged-in account, flattened for template use.
pub struct NavUser {
    pub name: String,
    pub role_label: &'static str,
    pub is_shopper: bool,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl Nav {
    /// Build the navbar view, syncing the cart badge for shoppers.
    pub async fn build(state: &AppState, auth: &SessionState) -> Self {
        let cart_count = state
            .carts()
            .sync(auth)
            .await
            .iter()
            .map(|item| item.quantity)
            .sum();

        let user = auth.user().map(|user| NavUser {
            name: user.name.clone(),
            role_label: user.role.label(),
            is_shopper: user.role == Role::User,
            is_admin: user.role == Role::Admin,
            is_super_admin: user.role == Role::SuperAdmin,
        });

        Self { user, cart_count }
    }
}

// =============================================================================
// View helpers
// =============================================================================

/// Format a decimal amount as a display price.
#[must_use]
pub fn format_price(amount: &Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Resolve a product image reference against the backend origin.
///
/// The backend stores uploaded images itself and returns paths like
/// `/uploads/x.png`; absolute URLs pass through unchanged.
#[must_use]
pub fn image_src(backend_url: &str, raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return raw.to_owned();
    }

    let origin = backend_url.trim_end_matches('/').trim_end_matches("/api");
    format!("{origin}{raw}")
}

/// Build a redirect target carrying a flash parameter.
fn with_param(path: &str, key: &str, value: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={}", urlencoding::encode(value))
}

/// Redirect with an error flash.
pub(crate) fn flash_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "error", message))
}

/// Redirect with a success flash.
pub(crate) fn flash_success(path: &str, message: &str) -> Redirect {
    Redirect::to(&with_param(path, "success", message))
}

// =============================================================================
// Router
// =============================================================================

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the backend API is reachable; returns 503 otherwise.
async fn readiness(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::http::StatusCode {
    if state.api().ping().await {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Unknown paths land back on the catalog.
async fn fallback() -> Redirect {
    Redirect::to("/")
}

/// Create the cart routes router.
fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the admin console router.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/carts/{id}", get(admin::user_cart))
        .route("/products/new", get(admin::new_product))
        .route("/products/{id}/edit", get(admin::edit_product))
        .route("/products", post(admin::create_product))
        .route("/products/{id}", post(admin::update_product))
        .route("/products/{id}/delete", post(admin::delete_product))
}

/// Create the super-admin console router.
fn superadmin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(superadmin::dashboard))
        .route("/admins", post(superadmin::create_admin))
        .route("/products/new", get(superadmin::new_product))
        .route("/products/{id}/edit", get(superadmin::edit_product))
        .route("/products", post(superadmin::create_product))
        .route("/products/{id}", post(superadmin::update_product))
        .route("/products/{id}/delete", post(superadmin::delete_product))
}

/// Build the complete application router, including the session and
/// revalidation layers. Shared between `main` and the integration tests.
pub fn router(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/", get(home::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .nest("/cart", cart_routes())
        .nest("/admin", admin_routes())
        .nest("/superadmin", superadmin_routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .fallback(fallback)
        // Innermost: revalidate credentials once the session is available
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            revalidate_session,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
