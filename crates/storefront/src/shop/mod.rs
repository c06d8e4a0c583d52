//! Typed client for the external commerce backend.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local sync, direct API calls
//! - Authenticated calls take the bearer credential explicitly; the client
//!   holds no hidden process-wide credential state
//! - In-memory caching via `moka` for the category list (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use electro_storefront::shop::{ProductFilter, ShopClient};
//!
//! let client = ShopClient::new(&config);
//!
//! // Authenticate and resolve the user
//! let token = client.login("user@example.com", "password").await?;
//! let user = client.me(&token).await?;
//!
//! // Browse the catalog
//! let products = client.products(&ProductFilter::new("phone", "")).await?;
//!
//! // Mutate the cart, then re-fetch it - mutation responses are never
//! // trusted for subsequent state
//! client.add_to_cart(&token, &products[0].id, 1).await?;
//! let cart = client.cart(&token).await?;
//! ```

mod client;
mod types;

pub use client::ShopClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum ShopError {
    /// HTTP transport failed (backend unreachable, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the bearer credential (401).
    #[error("unauthorized: credential rejected by backend")]
    Unauthorized,

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend returned an unexpected non-success status.
    #[error("backend returned {status}: {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Truncated response body for diagnostics.
        detail: String,
    },

    /// JSON parsing of a backend response failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ShopError {
    /// Whether this error means the credential is no longer valid.
    ///
    /// Used by session restore to distinguish "discard the credential"
    /// from transient failures.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
