//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// RFC 5321 upper bound on address length.
const MAX_EMAIL_LEN: usize = 254;

/// Why a string was rejected as an email address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Longer than the RFC 5321 limit.
    #[error("email must be at most {MAX_EMAIL_LEN} characters")]
    TooLong,
    /// Not of the form `local@domain` with both sides non-empty.
    #[error("not a valid email address")]
    Malformed,
}

/// An email address, checked for shape only.
///
/// The backend owns accounts and does the real validation; this wrapper
/// just guarantees something non-empty on both sides of a single `@`
/// within the length bound. Addresses arriving in backend responses
/// deserialize transparently and are taken as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] if the input is overlong, empty, or missing
    /// either side of the `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.len() > MAX_EMAIL_LEN {
            return Err(EmailError::TooLong);
        }
        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
