//! Session-related types.
//!
//! Types stored in the cookie session for authentication state. The bearer
//! credential and the resolved user live under separate keys: the
//! credential is written at login, while the user may be re-resolved from
//! `/me` during session restore.

use serde::{Deserialize, Serialize};

use electro_core::{Email, UserId};

use crate::shop::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's backend ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name shown in the header.
    pub full_name: String,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the bearer access token.
    pub const ACCESS_TOKEN: &str = "access_token";

    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
