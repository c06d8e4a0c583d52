//! HTTP client for the commerce backend.

use std::sync::Arc;
use std::time::Duration;

use electro_core::{AccessToken, CartItemId, ProductId};
use moka::future::Cache;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::StorefrontConfig;

use super::ShopError;
use super::types::{CartItem, CategoriesResponse, Product, ProductFilter, TokenResponse, User};

/// Category cache TTL. Categories change rarely; the catalog page renders
/// the select box on every request.
const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(300);

const CATEGORY_CACHE_KEY: &str = "categories";

/// Client for the commerce backend REST API.
///
/// Cheaply cloneable via `Arc`. Authenticated operations take the bearer
/// credential explicitly - there is no client-wide mutable credential, so
/// a request can never accidentally run under a stale identity.
#[derive(Clone)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

struct ShopClientInner {
    client: reqwest::Client,
    base_url: String,
    categories: Cache<&'static str, Vec<String>>,
}

impl ShopClient {
    /// Create a new backend client from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        let categories = Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ShopClientInner {
                client: reqwest::Client::new(),
                base_url: config.backend_url.clone(),
                categories,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    // =========================================================================
    // Response Handling
    // =========================================================================

    /// Map non-success statuses to typed errors.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShopError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ShopError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            let detail = response.text().await.unwrap_or_default();
            return Err(ShopError::NotFound(truncate(&detail)));
        }

        if !status.is_success() {
            let detail = truncate(&response.text().await.unwrap_or_default());
            tracing::error!(
                status = %status,
                body = %detail,
                "Backend returned non-success status"
            );
            return Err(ShopError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        Ok(response)
    }

    /// Read the body as text first for better error diagnostics, then parse.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShopError> {
        let response = Self::check_status(response).await?;
        let text = response.text().await?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&text),
                    "Failed to parse backend response"
                );
                Err(ShopError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a bearer token (`POST /login`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Unauthorized`] for bad credentials, or a
    /// transport/parse error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, ShopError> {
        let response = self
            .inner
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token: TokenResponse = Self::decode(response).await?;
        Ok(AccessToken::new(token.access_token))
    }

    /// Create an account (`POST /register`).
    ///
    /// Does not log in; callers follow up with [`Self::login`] using the
    /// same credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the request
    /// fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<(), ShopError> {
        let response = self
            .inner
            .client
            .post(self.url("/register"))
            .json(&json!({
                "email": email,
                "password": password,
                "full_name": full_name,
            }))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Resolve the current user for a credential (`GET /me`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Unauthorized`] for an expired or invalid token.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &AccessToken) -> Result<User, ShopError> {
        let response = self
            .inner
            .client
            .get(self.url("/me"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::decode(response).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products matching a filter (`GET /products`).
    ///
    /// Absent filter fields are omitted from the query string entirely;
    /// the backend distinguishes an omitted parameter from an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ShopError> {
        let mut request = self.inner.client.get(self.url("/products"));

        if let Some(search) = filter.search() {
            request = request.query(&[("search", search)]);
        }
        if let Some(category) = filter.category() {
            request = request.query(&[("category", category)]);
        }

        Self::decode(request.send().await?).await
    }

    /// Fetch a single product (`GET /products/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] for an unknown ID.
    #[instrument(skip(self))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ShopError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("/products/{id}")))
            .send()
            .await?;

        Self::decode(response).await
    }

    /// List the distinct category labels (`GET /categories`).
    ///
    /// Cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails and no cached value exists.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ShopError> {
        if let Some(categories) = self.inner.categories.get(CATEGORY_CACHE_KEY).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let response = self
            .inner
            .client
            .get(self.url("/categories"))
            .send()
            .await?;

        let body: CategoriesResponse = Self::decode(response).await?;
        self.inner
            .categories
            .insert(CATEGORY_CACHE_KEY, body.categories.clone())
            .await;

        Ok(body.categories)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the full cart collection (`GET /cart`).
    ///
    /// This is the only way cart state enters the client; mutation
    /// responses are never used as state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn cart(&self, token: &AccessToken) -> Result<Vec<CartItem>, ShopError> {
        let response = self
            .inner
            .client
            .get(self.url("/cart"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Add a product to the cart (`POST /cart`).
    ///
    /// Not idempotent: the backend may append a line or increment an
    /// existing one; the client does not deduplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &AccessToken,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ShopError> {
        let response = self
            .inner
            .client
            .post(self.url("/cart"))
            .bearer_auth(token.as_str())
            .json(&json!({
                "product_id": product_id,
                "quantity": quantity,
            }))
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Update a line item's quantity (`PUT /cart/{id}?quantity=`).
    ///
    /// The requested quantity is clamped to a minimum of 1 before it is
    /// transmitted; 0 or negative never reaches the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] for an unknown line item.
    #[instrument(skip(self, token))]
    pub async fn set_quantity(
        &self,
        token: &AccessToken,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<(), ShopError> {
        let quantity = clamp_quantity(quantity);

        let response = self
            .inner
            .client
            .put(self.url(&format!("/cart/{item_id}")))
            .query(&[("quantity", quantity)])
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Remove a line item (`DELETE /cart/{id}`).
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotFound`] for an unknown line item.
    #[instrument(skip(self, token))]
    pub async fn remove_item(
        &self,
        token: &AccessToken,
        item_id: &CartItemId,
    ) -> Result<(), ShopError> {
        let response = self
            .inner
            .client
            .delete(self.url(&format!("/cart/{item_id}")))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Remove every line item (`DELETE /cart`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &AccessToken) -> Result<(), ShopError> {
        let response = self
            .inner
            .client
            .delete(self.url("/cart"))
            .bearer_auth(token.as_str())
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }
}

/// Line item quantities are at least 1; decrement clamps here rather than
/// ever transmitting 0.
const fn clamp_quantity(quantity: u32) -> u32 {
    if quantity == 0 { 1 } else { quantity }
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_quantity_floor_is_one() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(1), 1);
        assert_eq!(clamp_quantity(7), 7);
    }

    #[test]
    fn test_truncate_caps_body() {
        let long = "x".repeat(2000);
        assert_eq!(truncate(&long).len(), 500);
        assert_eq!(truncate("short"), "short");
    }
}
