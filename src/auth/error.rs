// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Token issuance, verification and bearer extraction errors.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Neither a bearer header nor a `token` body field
    MissingToken,
    /// Token is not three base64url segments, or its header/claims don't parse
    MalformedToken,
    /// Header names an algorithm other than HS256
    UnexpectedAlgorithm(String),
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Caller tried to set a server-assigned claim
    ReservedClaim(&'static str),
    /// Token carries no `id` claim
    MissingSubject,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnexpectedAlgorithm(_) => "unexpected_algorithm",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::ReservedClaim(_) => "reserved_claim",
            AuthError::MissingSubject => "missing_subject",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::UnexpectedAlgorithm(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::MissingSubject => StatusCode::UNAUTHORIZED,
            AuthError::ReservedClaim(_) => StatusCode::BAD_REQUEST,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MissingToken => {
                write!(f, "A bearer token is required in the Authorization header or request body")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::UnexpectedAlgorithm(alg) => {
                write!(f, "Unexpected signing algorithm: {alg}")
            }
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::ReservedClaim(claim) => {
                write!(f, "Claim '{claim}' is assigned by the server and cannot be supplied")
            }
            AuthError::MissingSubject => write!(f, "Token does not identify a user"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AuthError::InternalError(ref msg) = self {
            tracing::error!(error = %msg, "authentication internal error");
        }
        let body = Json(AuthErrorBody {
            error: match self {
                AuthError::InternalError(_) => "Internal authentication error".to_string(),
                ref other => other.to_string(),
            },
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
