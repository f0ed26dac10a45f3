//! Admin console: customer accounts, live carts, product management.
//!
//! The product form plumbing here is shared with the super-admin console,
//! which mounts the same management surface under its own prefix.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::warn;

use nexus_core::{Product, Role, UserId};

use crate::api::{ImageUpload, ProductDraft};
use crate::authz::RequireAdmin;
use crate::filters;
use crate::session::SessionState;
use crate::state::AppState;

use super::{Nav, flash_error, flash_success, format_price, image_src};

// =============================================================================
// Query and view types
// =============================================================================

/// Dashboard query parameters.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// A user account row.
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
}

impl UserRow {
    pub(crate) fn from_user(user: &nexus_core::User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.to_string(),
            role_label: user.role.label(),
        }
    }
}

/// A product row in the management tables.
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: i64,
    pub low_stock: bool,
    pub image_url: Option<String>,
}

impl ProductRow {
    pub(crate) fn from_product(state: &AppState, product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: format_price(&product.price),
            stock: product.stock,
            low_stock: product.stock < 10,
            image_url: product
                .image_url
                .as_deref()
                .map(|raw| image_src(&state.config().backend_url, raw)),
        }
    }
}

/// A line in the per-customer cart view.
pub struct CartLineRow {
    pub name: String,
    pub quantity: u32,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub nav: Nav,
    pub tab: String,
    pub customers: Vec<UserRow>,
    pub products: Vec<ProductRow>,
    pub can_delete: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Per-customer cart view template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/user_cart.html")]
pub struct UserCartTemplate {
    pub nav: Nav,
    pub lines: Vec<CartLineRow>,
    pub total: String,
    pub back: &'static str,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Prefill values for the product form.
#[derive(Default)]
pub struct ProductFormValues {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category: String,
    pub image_url: String,
}

impl ProductFormValues {
    pub(crate) fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            category: product.category.clone().unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
        }
    }
}

/// Product create/edit form template, shared by both consoles.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub nav: Nav,
    pub heading: &'static str,
    pub action: String,
    pub cancel: &'static str,
    pub values: ProductFormValues,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Form parsing
// =============================================================================

/// Parse the multipart product form into a draft.
///
/// The image can arrive either as an uploaded file (`image`) or as a plain
/// URL (`image_url`); the file wins when both are present. Errors are
/// user-facing flash messages.
pub(crate) async fn parse_product_form(mut multipart: Multipart) -> Result<ProductDraft, String> {
    let mut name = String::new();
    let mut description = String::new();
    let mut price_raw = String::new();
    let mut stock_raw = String::new();
    let mut category = None;
    let mut image_url = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| "Invalid form submission".to_owned())?
    {
        let Some(field_name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match field_name.as_str() {
            "name" => name = read_text(field).await?,
            "description" => description = read_text(field).await?,
            "price" => price_raw = read_text(field).await?,
            "stock" => stock_raw = read_text(field).await?,
            "category" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    category = Some(value.trim().to_owned());
                }
            }
            "image_url" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    image_url = Some(value.trim().to_owned());
                }
            }
            "image" => {
                let filename = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                let content_type = field
                    .content_type()
                    .map_or_else(|| "application/octet-stream".to_owned(), ToOwned::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| "Could not read the uploaded image".to_owned())?;

                if !filename.is_empty() && !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    if name.trim().is_empty() {
        return Err("Product name is required".to_owned());
    }

    let price = price_raw
        .trim()
        .parse()
        .map_err(|_| "Price must be a number".to_owned())?;

    let stock: i64 = stock_raw
        .trim()
        .parse()
        .map_err(|_| "Stock must be a whole number".to_owned())?;
    if stock < 0 {
        return Err("Stock cannot be negative".to_owned());
    }

    Ok(ProductDraft {
        name: name.trim().to_owned(),
        description: description.trim().to_owned(),
        price,
        stock,
        category,
        image_url,
        image,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, String> {
    field
        .text()
        .await
        .map_err(|_| "Invalid form submission".to_owned())
}

/// Look up a product in the catalog snapshot.
pub(crate) async fn find_product(state: &AppState, id: &str) -> Option<Product> {
    let needle = nexus_core::ProductId::new(id);
    match state.api().products().await {
        Ok(snapshot) => snapshot.iter().find(|p| p.id == needle).cloned(),
        Err(e) => {
            warn!("Failed to fetch products: {e}");
            None
        }
    }
}

// =============================================================================
// Dashboard handlers
// =============================================================================

/// Display the admin dashboard: customers by default, products on request.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let Some((token, user)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    let tab = match query.tab.as_deref() {
        Some("products") => "products",
        _ => "users",
    };

    let mut error = query.error;
    let mut customers = Vec::new();
    let mut products = Vec::new();

    if tab == "users" {
        match state.api().customers(token).await {
            Ok(list) => customers = list.iter().map(UserRow::from_user).collect(),
            Err(e) => {
                warn!("Failed to fetch customers: {e}");
                error.get_or_insert_with(|| "Failed to load users".to_owned());
            }
        }
    } else {
        match state.api().products().await {
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
        }
    }

    AdminDashboardTemplate {
        nav: Nav::build(&state, &auth).await,
        tab: tab.to_owned(),
        customers,
        products,
        can_delete: user.role == Role::SuperAdmin,
        error,
        success: query.success,
    }
    .into_response()
}

/// Display a customer's live cart, fetched on demand.
pub async fn user_cart(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    let Some((token, _)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    let owner = UserId::new(id);
    let (lines, total, error) = match state.api().cart_for_user(token, &owner).await {
        Ok(items) => {
            let total: rust_decimal::Decimal = items.iter().map(|i| i.line_total()).sum();
            let lines = items
                .iter()
                .map(|item| CartLineRow {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    line_total: format_price(&item.line_total()),
                    image_url: item
                        .product
                        .image_url
                        .as_deref()
                        .map(|raw| image_src(&state.config().backend_url, raw)),
                })
                .collect();
            (lines, total, None)
        }
        Err(e) => {
            warn!("Failed to fetch user cart: {e}");
            (
                Vec::new(),
                rust_decimal::Decimal::ZERO,
                Some("Could not retrieve cart details".to_owned()),
            )
        }
    };

    UserCartTemplate {
        nav: Nav::build(&state, &auth).await,
        lines,
        total: format_price(&total),
        back: "/admin",
        error,
        success: None,
    }
    .into_response()
}

// =============================================================================
// Product management handlers
// =============================================================================

/// Display the blank product form.
pub async fn new_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Query(query): Query<super::MessageQuery>,
) -> impl IntoResponse {
    ProductFormTemplate {
        nav: Nav::build(&state, &auth).await,
        heading: "Add Product",
        action: "/admin/products".to_owned(),
        cancel: "/admin?tab=products",
        values: ProductFormValues::default(),
        error: query.error,
        success: query.success,
    }
}

/// Display the product form prefilled from the catalog snapshot.
pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<super::MessageQuery>,
) -> Response {
    let Some(product) = find_product(&state, &id).await else {
        return flash_error("/admin?tab=products", "Product not found").into_response();
    };

    ProductFormTemplate {
        nav: Nav::build(&state, &auth).await,
        heading: "Edit Product",
        action: format!("/admin/products/{id}"),
        cancel: "/admin?tab=products",
        values: ProductFormValues::from_product(&product),
        error: query.error,
        success: query.success,
    }
    .into_response()
}

/// Create a product from the submitted form.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    multipart: Multipart,
) -> Response {
    submit_product(&state, &auth, None, multipart, ConsolePaths::ADMIN).await
}

/// Update a product from the submitted form.
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    submit_product(&state, &auth, Some(id), multipart, ConsolePaths::ADMIN).await
}

/// Delete a product. Deletion is reserved for super-admins even inside the
/// admin console, mirroring the original client's in-page check.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<String>,
) -> Response {
    remove_product(&state, &auth, &id, ConsolePaths::ADMIN).await
}

// =============================================================================
// Shared console plumbing
// =============================================================================

/// Redirect targets for one console's product management surface.
#[derive(Clone, Copy)]
pub(crate) struct ConsolePaths {
    pub products_tab: &'static str,
    pub new_form: &'static str,
    pub edit_prefix: &'static str,
}

impl ConsolePaths {
    pub(crate) const ADMIN: Self = Self {
        products_tab: "/admin?tab=products",
        new_form: "/admin/products/new",
        edit_prefix: "/admin/products",
    };

    pub(crate) const SUPER_ADMIN: Self = Self {
        products_tab: "/superadmin?tab=products",
        new_form: "/superadmin/products/new",
        edit_prefix: "/superadmin/products",
    };
}

/// Create or update a product and redirect with the outcome.
pub(crate) async fn submit_product(
    state: &AppState,
    auth: &SessionState,
    id: Option<String>,
    multipart: Multipart,
    paths: ConsolePaths,
) -> Response {
    let Some((token, _)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    let form_path = id.as_ref().map_or_else(
        || paths.new_form.to_owned(),
        |id| format!("{}/{id}/edit", paths.edit_prefix),
    );

    let draft = match parse_product_form(multipart).await {
        Ok(draft) => draft,
        Err(message) => return flash_error(&form_path, &message).into_response(),
    };

    let result = match &id {
        Some(id) => {
            state
                .api()
                .update_product(token, &nexus_core::ProductId::new(id.clone()), &draft)
                .await
        }
        None => state.api().create_product(token, &draft).await,
    };

    match result {
        Ok(()) => {
            let message = if id.is_some() {
                "Product updated"
            } else {
                "Product created"
            };
            flash_success(paths.products_tab, message).into_response()
        }
        Err(e) => {
            warn!("Product save failed: {e}");
            flash_error(&form_path, &e.to_string()).into_response()
        }
    }
}

/// Delete a product after the super-admin check.
pub(crate) async fn remove_product(
    state: &AppState,
    auth: &SessionState,
    id: &str,
    paths: ConsolePaths,
) -> Response {
    let Some((token, user)) = auth.credentials() else {
        return Redirect::to("/login").into_response();
    };

    if user.role != Role::SuperAdmin {
        return flash_error(paths.products_tab, "Unauthorized action").into_response();
    }

    match state
        .api()
        .delete_product(token, &nexus_core::ProductId::new(id))
        .await
    {
        Ok(()) => flash_success(paths.products_tab, "Product deleted").into_response(),
        Err(e) => {
            warn!("Product delete failed: {e}");
            flash_error(paths.products_tab, "Delete failed").into_response()
        }
    }
}
