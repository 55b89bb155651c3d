//! HTTP-facing error type for Cosmoport server.

use std::fmt;

use actix_web::error::BlockingError;
use actix_web::{HttpResponse, http::StatusCode};
use cosmoport_core::ShipError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error response payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

/// Failure of a request after decoding.
#[derive(Debug)]
pub enum ApiError {
    /// Domain failure: validation, missing record, or store error.
    Ship(ShipError),
    /// Query or transaction failure outside the store calls.
    Database(diesel::result::Error),
    /// No pooled connection available.
    Pool(diesel::r2d2::PoolError),
    /// The in-memory store lock was poisoned by a panicking request.
    Poisoned,
    /// The blocking worker running the request was cancelled.
    Blocking(BlockingError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ship(ShipError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ship(ShipError::NotFound) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error as a JSON response, logging internal failures.
    pub fn into_response(self) -> HttpResponse {
        let status = self.status();
        let message = if status.is_server_error() {
            log::error!("request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorResponse { message })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Ship(err) => write!(f, "{err}"),
            ApiError::Database(err) => write!(f, "database error: {err}"),
            ApiError::Pool(err) => write!(f, "connection pool error: {err}"),
            ApiError::Poisoned => write!(f, "ship store lock poisoned"),
            ApiError::Blocking(err) => write!(f, "blocking task failed: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ShipError> for ApiError {
    fn from(value: ShipError) -> Self {
        ApiError::Ship(value)
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(value: diesel::result::Error) -> Self {
        ApiError::Database(value)
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(value: diesel::r2d2::PoolError) -> Self {
        ApiError::Pool(value)
    }
}

impl From<BlockingError> for ApiError {
    fn from(value: BlockingError) -> Self {
        ApiError::Blocking(value)
    }
}
