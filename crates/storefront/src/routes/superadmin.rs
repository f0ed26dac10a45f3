//! Super-admin console: every account, all cart activity, product
//! management, and admin provisioning.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::warn;

use nexus_core::Email;

use crate::api::NewAccount;
use crate::authz::RequireSuperAdmin;
use crate::filters;
use crate::state::AppState;

use super::admin::{
    ConsolePaths, ProductFormTemplate, ProductFormValues, ProductRow, UserRow, find_product,
    remove_product, submit_product,
};
use super::{Nav, flash_error, flash_success, format_price, image_src};

// =============================================================================
// Query, form and view types
// =============================================================================

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Admin provisioning form data.
#[derive(Debug, Deserialize)]
pub struct CreateAdminForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A row in the all-carts activity table.
pub struct CartActivityRow {
    pub user_name: String,
    pub user_email: String,
    pub product_name: String,
    pub quantity: u32,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Super-admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "superadmin/dashboard.html")]
pub struct SuperAdminDashboardTemplate {
    pub nav: Nav,
    pub tab: String,
    pub users: Vec<UserRow>,
    pub products: Vec<ProductRow>,
    pub carts: Vec<CartActivityRow>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the super-admin dashboard: users by default, products or the
/// flat cart activity list on request.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let Some((token, _)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    let tab = match query.tab.as_deref() {
        Some("products") => "products",
        Some("carts") => "carts",
        _ => "users",
    };

    let mut error = query.error;
    let mut users = Vec::new();
    let mut products = Vec::new();
    let mut carts = Vec::new();

    match tab {
        "products" => match state.api().products().await {
            Ok(snapshot) => {
                products = snapshot
                    .iter()
                    .map(|p| ProductRow::from_product(&state, p))
                    .collect();
            }
            Err(e) => {
                warn!("Failed to fetch products: {e}");
                error.get_or_insert_with(|| "Failed to load products".to_owned());
            }
        },
        "carts" => match state.api().all_cart_items(token).await {
            Ok(items) => {
                carts = items
                    .iter()
                    .map(|item| CartActivityRow {
                        user_name: item.user.name.clone(),
                        user_email: item.user.email.to_string(),
                        product_name: item.product.name.clone(),
                        quantity: item.quantity,
                        line_total: format_price(&item.line_total()),
                        image_url: item
                            .product
                            .image_url
                            .as_deref()
                            .map(|raw| image_src(&state.config().backend_url, raw)),
                    })
                    .collect();
            }
            Err(e) => {
                warn!("Failed to fetch cart activity: {e}");
                error.get_or_insert_with(|| "Failed to load carts".to_owned());
            }
        },
        _ => match state.api().all_users(token).await {
            Ok(list) => users = list.iter().map(UserRow::from_user).collect(),
            Err(e) => {
                warn!("Failed to fetch users: {e}");
                error.get_or_insert_with(|| "Failed to load users".to_owned());
            }
        },
    }

    SuperAdminDashboardTemplate {
        nav: Nav::build(&state, &auth).await,
        tab: tab.to_owned(),
        users,
        products,
        carts,
        error,
        success: query.success,
    }
    .into_response()
}

/// Provision an admin account.
pub async fn create_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Form(form): Form<CreateAdminForm>,
) -> Response {
    let Some((token, _)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    if form.name.trim().is_empty() {
        return flash_error("/superadmin", "Please enter a name").into_response();
    }

    if Email::parse(form.email.trim()).is_err() {
        return flash_error("/superadmin", "Please enter a valid email address").into_response();
    }

    if form.password.len() < 8 {
        return flash_error("/superadmin", "Password must be at least 8 characters")
            .into_response();
    }

    let account = NewAccount {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password,
    };

    match state.api().create_admin(token, &account).await {
        Ok(()) => flash_success("/superadmin", "Admin created successfully!").into_response(),
        Err(e) => {
            warn!("Admin provisioning failed: {e}");
            flash_error("/superadmin", &e.to_string()).into_response()
        }
    }
}

/// Display the blank product form.
pub async fn new_product(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Query(query): Query<super::MessageQuery>,
) -> impl IntoResponse {
    ProductFormTemplate {
        nav: Nav::build(&state, &auth).await,
        heading: "Add Product",
        action: "/superadmin/products".to_owned(),
        cancel: "/superadmin?tab=products",
        values: ProductFormValues::default(),
        error: query.error,
        success: query.success,
    }
}

/// Display the product form prefilled from the catalog snapshot.
pub async fn edit_product(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<String>,
    Query(query): Query<super::MessageQuery>,
) -> Response {
    let Some(product) = find_product(&state, &id).await else {
        return flash_error("/superadmin?tab=products", "Product not found").into_response();
    };

    ProductFormTemplate {
        nav: Nav::build(&state, &auth).await,
        heading: "Edit Product",
        action: format!("/superadmin/products/{id}"),
        cancel: "/superadmin?tab=products",
        values: ProductFormValues::from_product(&product),
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Create a product from the submitted form.
pub async fn create_product(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    multipart: Multipart,
) -> Response {
    submit_product(&state, &auth, None, multipart, ConsolePaths::SUPER_ADMIN).await
}

/// Update a product from the submitted form.
pub async fn update_product(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    submit_product(&state, &auth, Some(id), multipart, ConsolePaths::SUPER_ADMIN).await
}

/// Delete a product.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireSuperAdmin(auth): RequireSuperAdmin,
    Path(id): Path<String>,
) -> Response {
    remove_product(&state, &auth, &id, ConsolePaths::SUPER_ADMIN).await
}
