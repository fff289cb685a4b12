// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require a bearer token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Verifies the `Authorization: Bearer <token>` header with the server's
/// [`TokenService`](super::TokenService). The token must carry an `id` claim.
///
/// # Example
///
/// ```rust,ignore
/// async fn issue_wallet(
///     Auth(user): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<WalletResponse>, ApiError> {
///     // user.user_id is the widget `id` claim
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)?.ok_or(AuthError::MissingAuthHeader)?;
        let verified = state.tokens.verify(token)?;
        let user = AuthenticatedUser::from_token(verified)?;

        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// Bearer token from the `Authorization` header.
///
/// `Ok(None)` when the header is absent. The scheme is matched
/// case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(Some(token))
}
