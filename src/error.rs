//! Request-path error taxonomy and its HTTP mapping.
//!
//! Every error is handled at the boundary where it is detected: handlers turn
//! client errors into a `ServiceError`, which renders itself as a plain-text
//! response whose body is exactly the error message.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::clients::LocationError;

/// Coarse classification of a `ServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed client input (400 / 422).
    Validation,
    /// Wrong HTTP verb (405).
    Method,
    /// The postal code did not resolve to a city (404).
    Resolution,
    /// A required credential is missing (500).
    Configuration,
    /// Transport failure or non-success answer from a downstream (500).
    Upstream,
}

/// Errors surfaced to HTTP clients by either service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid request body")]
    InvalidBody(#[source] serde_json::Error),

    #[error("CEP is required")]
    CepRequired,

    #[error("invalid zipcode")]
    InvalidZipcode,

    #[error("can not find zipcode")]
    ZipcodeNotFound(#[source] LocationError),

    #[error("missing WEATHERAPI_KEY")]
    MissingApiKey,

    /// Message is forwarded verbatim.
    #[error("{0}")]
    Upstream(String),
}

/// Result type for handler pipelines.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::MethodNotAllowed => ErrorKind::Method,
            ServiceError::InvalidBody(_)
            | ServiceError::CepRequired
            | ServiceError::InvalidZipcode => ErrorKind::Validation,
            ServiceError::ZipcodeNotFound(_) => ErrorKind::Resolution,
            ServiceError::MissingApiKey => ErrorKind::Configuration,
            ServiceError::Upstream(_) => ErrorKind::Upstream,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServiceError::InvalidBody(_) | ServiceError::CepRequired => StatusCode::BAD_REQUEST,
            ServiceError::InvalidZipcode => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ZipcodeNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::MissingApiKey | ServiceError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
