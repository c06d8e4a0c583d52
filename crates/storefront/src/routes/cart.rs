//! Cart route handlers.
//!
//! The cart lives on the backend; this module never keeps a local copy.
//! Every mutation is POST-redirect-GET: the handler issues the change, then
//! redirects to a view that re-fetches the cart, so the page always shows
//! the server's version of the cart even when a mutation partially failed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use electro_core::{CartItemId, ProductId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::shop::{CartItem, cart_total};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image_url: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product.id.to_string(),
            name: item.product.name.clone(),
            image_url: item.product.image_url.clone(),
            quantity: item.quantity,
            price: item.product.price.display(),
            line_total: item.line_total().display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&[CartItem]> for CartView {
    fn from(items: &[CartItem]) -> Self {
        Self {
            items: items.iter().map(CartItemView::from).collect(),
            total: cart_total(items).display(),
            item_count: items.iter().map(|item| item.quantity).sum(),
        }
    }
}

impl CartView {
    /// View for a cart whose contents could not be loaded.
    fn unavailable() -> Self {
        Self::from(&[] as &[CartItem])
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    /// Path to return to after adding; defaults to the catalog.
    pub next: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Restrict a form-supplied redirect target to local paths.
fn local_redirect(next: Option<String>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/".to_string(),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: CurrentUser,
    pub cart: CartView,
    /// Duplicates `cart.item_count` for the shared header partial.
    pub cart_count: u32,
    pub load_failed: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
///
/// A failed fetch degrades to an "unavailable" notice rather than an error
/// page; the notice is distinct from the empty-cart state so the visitor is
/// never told a cart the backend still holds is empty.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<CartShowTemplate> {
    let (cart, load_failed) = match state.shop().cart(&auth.token).await {
        Ok(items) => (CartView::from(items.as_slice()), false),
        Err(e) if e.is_auth_failure() => return Err(AppError::from(e)),
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            (CartView::unavailable(), true)
        }
    };
    let cart_count = cart.item_count;

    Ok(CartShowTemplate {
        user: auth.user,
        cart,
        cart_count,
        load_failed,
    })
}

/// Add a product to the cart, then return to the originating page.
#[instrument(skip(state, auth))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::from(form.product_id);
    state
        .shop()
        .add_to_cart(&auth.token, &product_id, form.quantity.unwrap_or(1))
        .await?;

    Ok(Redirect::to(&local_redirect(form.next)))
}

/// Set a line's quantity, then re-render the cart from the backend.
#[instrument(skip(state, auth))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let item_id = CartItemId::from(form.item_id);
    state
        .shop()
        .set_quantity(&auth.token, &item_id, form.quantity)
        .await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a line, then re-render the cart from the backend.
#[instrument(skip(state, auth))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let item_id = CartItemId::from(form.item_id);
    state.shop().remove_item(&auth.token, &item_id).await?;

    Ok(Redirect::to("/cart"))
}

/// Empty the cart, then re-render it from the backend.
#[instrument(skip(state, auth))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Redirect> {
    state.shop().clear_cart(&auth.token).await?;

    Ok(Redirect::to("/cart"))
}
