//! Wire types for the commerce backend API.
//!
//! These mirror the backend's JSON payloads exactly; unknown fields (e.g.
//! `created_at` timestamps) are ignored on deserialization.

use electro_core::{CartItemId, Email, Price, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// The authenticated user's profile (`GET /me`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
}

/// A catalog product. Read-only from the client's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    pub rating: f64,
}

/// One product-quantity pairing within the cart (`GET /cart`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// The line total: `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// The derived cart total: Σ `price × quantity` over line items.
///
/// Recomputed on every render, never persisted.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Price {
    items.iter().map(CartItem::line_total).sum()
}

/// Successful login response (`POST /login`).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

/// Category listing response (`GET /categories`).
#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Catalog filter state.
///
/// Absent fields are omitted from the request entirely - "no filter" and
/// "filter on empty string" are distinct to the backend, so empty strings
/// normalize to `None` at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    search: Option<String>,
    category: Option<String>,
}

impl ProductFilter {
    /// Build a filter, treating empty strings as "no filter".
    #[must_use]
    pub fn new(search: &str, category: &str) -> Self {
        Self {
            search: some_if_nonempty(search),
            category: some_if_nonempty(category),
        }
    }

    /// Free-text search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Exact-match category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

fn some_if_nonempty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(price: &str, quantity: u32) -> CartItem {
        let product: Product = serde_json::from_str(&format!(
            r#"{{
                "id": "p1",
                "name": "Widget",
                "description": "",
                "price": {price},
                "category": "gadgets",
                "image_url": "https://example.com/w.jpg",
                "stock": 5,
                "rating": 4.5
            }}"#
        ))
        .unwrap();

        CartItem {
            id: CartItemId::from("ci-1"),
            product,
            quantity,
        }
    }

    #[test]
    fn test_cart_total() {
        // [{price: 10, qty: 2}, {price: 3.5, qty: 1}] => $23.50
        let items = vec![item("10", 2), item("3.5", 1)];
        assert_eq!(cart_total(&items).display(), "$23.50");
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]).display(), "$0.00");
    }

    #[test]
    fn test_filter_normalizes_empty_to_none() {
        let filter = ProductFilter::new("", "");
        assert_eq!(filter.search(), None);
        assert_eq!(filter.category(), None);

        let filter = ProductFilter::new("  ", "");
        assert_eq!(filter.search(), None);
    }

    #[test]
    fn test_filter_keeps_values() {
        let filter = ProductFilter::new("phone", "smartphones");
        assert_eq!(filter.search(), Some("phone"));
        assert_eq!(filter.category(), Some("smartphones"));
    }

    #[test]
    fn test_product_ignores_unknown_fields() {
        let product: Product = serde_json::from_str(
            r#"{
                "id": "p1",
                "name": "iPhone 14 Pro",
                "description": "Latest iPhone",
                "price": 999.99,
                "category": "smartphones",
                "image_url": "https://example.com/p.jpg",
                "stock": 25,
                "rating": 4.5,
                "created_at": "2026-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(product.price.display(), "$999.99");
        assert_eq!(product.stock, 25);
    }
}
