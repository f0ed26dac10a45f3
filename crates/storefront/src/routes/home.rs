//! Catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use nexus_core::Product;

use crate::filters;
use crate::session::AuthSession;
use crate::state::AppState;

use super::{Nav, format_price, image_src};

/// Catalog query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Case-insensitive substring filter over name and category.
    pub q: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Product display data for the catalog grid.
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: i64,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub products: Vec<ProductCard>,
    pub query: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Case-insensitive substring match over name and category. This is the
/// whole search story - no ranking.
fn matches_filter(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let needle = needle.to_lowercase();
    if product.name.to_lowercase().contains(&needle) {
        return true;
    }
    product
        .category
        .as_deref()
        .is_some_and(|category| category.to_lowercase().contains(&needle))
}

/// Display the catalog.
pub async fn index(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    let auth = auth.state().await;
    let nav = Nav::build(&state, &auth).await;
    let needle = query.q.unwrap_or_default();

    let mut error = query.error;
    let products = match state.api().products().await {
        Ok(snapshot) => snapshot
            .iter()
            .filter(|product| matches_filter(product, &needle))
            .map(|product| ProductCard {
                id: product.id.to_string(),
                name: product.name.clone(),
                description: product.description.clone(),
                price: format_price(&product.price),
                stock: product.stock,
                in_stock: product.in_stock(),
                image_url: product
                    .image_url
                    .as_deref()
                    .map(|raw| image_src(&state.config().backend_url, raw)),
            })
            .collect(),
        Err(e) => {
            warn!("Failed to fetch products: {e}");
            error.get_or_insert_with(|| "Could not load products".to_owned());
            Vec::new()
        }
    };

    HomeTemplate {
        nav,
        products,
        query: needle,
        error,
        success: query.success,
    }
}
