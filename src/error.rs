// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::{AuthError, IdentityError};
use crate::config::ConfigError;
use crate::crypto::CryptoError;
use crate::custody::CustodyError;
use crate::storage::StoreError;

/// Message returned for every 5xx; details stay in the logs.
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Log `detail` and answer with a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingHash | IdentityError::MalformedDataCheckString(_) => {
                Self::bad_request(err.to_string())
            }
            IdentityError::HashMismatch => Self::unauthorized(err.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InternalError(_) => Self::internal(&err),
            _ => Self::new(err.status_code(), err.to_string()),
        }
    }
}

impl From<CustodyError> for ApiError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::InvalidRequest(msg) => Self::bad_request(msg),
            CustodyError::OwnershipVerificationFailed => Self::forbidden("Wallet verification failed"),
            CustodyError::DuplicateWallet(_) => Self::conflict("Wallet already exists"),
            CustodyError::MissingSecret(_)
            | CustodyError::KeyGeneration(_)
            | CustodyError::Crypto(_)
            | CustodyError::Store(_)
            | CustodyError::Internal(_) => Self::internal(&err),
        }
    }
}

/// Startup failures. Any of these aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("key derivation setup failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
