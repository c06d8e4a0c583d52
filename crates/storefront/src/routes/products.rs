//! Product catalog route handlers.
//!
//! The catalog is the authenticated home view. Search and category filters
//! live in the query string, so the filtered view is reloadable and
//! shareable; blank filters are normalized away before reaching the
//! backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use electro_core::ProductId;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::shop::{Product, ProductFilter};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    pub rating: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
            stock: product.stock,
            rating: format!("{:.1}", product.rating),
        }
    }
}

/// Catalog filter query parameters.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user: CurrentUser,
    pub products: Vec<ProductView>,
    pub categories: Vec<String>,
    pub search: String,
    pub category: String,
    pub cart_count: u32,
    pub load_failed: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub user: CurrentUser,
    pub product: ProductView,
    pub cart_count: u32,
}

/// Display the product catalog.
///
/// Filter failures degrade to an empty listing rather than an error page;
/// the visitor keeps the search form and can retry.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<ProductsIndexTemplate> {
    let search = query.search.unwrap_or_default();
    let category = query.category.unwrap_or_default();
    let filter = ProductFilter::new(&search, &category);

    let (products, load_failed) = match state.shop().products(&filter).await {
        Ok(products) => (products, false),
        Err(e) if e.is_auth_failure() => return Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!("Failed to fetch products: {e}");
            (Vec::new(), true)
        }
    };

    let categories = match state.shop().categories().await {
        Ok(categories) => categories,
        Err(e) => {
            tracing::warn!("Failed to fetch categories: {e}");
            Vec::new()
        }
    };

    let cart_count = cart_count(&state, &auth.token).await;

    Ok(ProductsIndexTemplate {
        user: auth.user,
        products: products.iter().map(ProductView::from).collect(),
        categories,
        search,
        category,
        cart_count,
        load_failed,
    })
}

/// Display a single product.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.shop().product(&ProductId::from(id)).await?;
    let cart_count = cart_count(&state, &auth.token).await;

    Ok(ProductShowTemplate {
        user: auth.user,
        product: ProductView::from(&product),
        cart_count,
    })
}

/// Total units across the visitor's cart, for the header badge.
///
/// A fetch failure shows a zero badge; the catalog should not error over
/// the badge.
async fn cart_count(state: &AppState, token: &electro_core::AccessToken) -> u32 {
    match state.shop().cart(token).await {
        Ok(items) => items.iter().map(|item| item.quantity).sum(),
        Err(e) => {
            tracing::debug!("Failed to fetch cart for badge: {e}");
            0
        }
    }
}
