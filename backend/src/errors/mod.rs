//! Global application error types and handlers.
//!
//! `ApiError` is the single error type returned by handlers and middleware.
//! It maps every failure to a status code and a `{"error": "..."}` body;
//! internal details are logged and never sent to the client.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bank_adapters::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::{AuthError, CredentialError};
use crate::services::transfer::TransferError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Well-formed request refused by a business rule (400).
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Unauthenticated(AuthError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("account store did not respond in time")]
    Timeout,

    /// A response produced outside the handlers (unknown route, wrong
    /// method, oversized body, request deadline).
    #[error("{}", .0.canonical_reason().unwrap_or("request failed").to_lowercase())]
    Http(StatusCode),

    /// Details are logged when the error is created.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create internal error - logs details but shows generic message
    pub fn internal(details: impl Into<String>) -> Self {
        let details = details.into();
        error!(error = %details, "Internal error occurred");
        Self::Internal(details)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Http(status) => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.client_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::Http(StatusCode::PAYLOAD_TOO_LARGE),
            _ => Self::Validation(rejection.body_text()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Signing(details) => Self::internal(format!("token signing failed: {details}")),
            other => Self::Unauthenticated(other),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Mismatch => Self::Unauthenticated(AuthError::InvalidCredentials),
            CredentialError::Hashing(details) => Self::internal(details),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::not_found("account not found"),
            StoreError::DuplicateNumber(_) => Self::Conflict("account number already in use".into()),
            StoreError::Conflict(_) => {
                Self::Conflict("account balance changed concurrently, retry the request".into())
            }
            StoreError::Unavailable(details) => Self::internal(details),
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NonPositiveAmount
            | TransferError::SameAccount
            | TransferError::InsufficientFunds
            | TransferError::AmountOutOfRange => Self::Rejected(err.to_string()),
            TransferError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            TransferError::Timeout => Self::Timeout,
            TransferError::PartialTransferFailure { .. } => Self::internal(err.to_string()),
            TransferError::Store(store) => store.into(),
        }
    }
}
