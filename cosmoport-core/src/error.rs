//! Error types for Cosmoport core.

use std::{error::Error, fmt};

/// Error raised by a [`ShipStore`](crate::store::ShipStore) implementation.
pub type StoreError = Box<dyn Error + Send + Sync>;

/// Error type for Cosmoport domain operations.
#[derive(Debug)]
pub enum ShipError {
    /// Input violates a domain constraint.
    BadRequest(String),
    /// The referenced ship does not exist.
    NotFound,
    /// The underlying store failed.
    Store(StoreError),
}

impl ShipError {
    /// Build a [`ShipError::BadRequest`] from a short reason.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl fmt::Display for ShipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::NotFound => write!(f, "Ship not found!"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl Error for ShipError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<StoreError> for ShipError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Convenience result type for Cosmoport core.
pub type Result<T> = std::result::Result<T, ShipError>;
