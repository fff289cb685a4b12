// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Login-widget verification and HS256 bearer tokens.
//!
//! ## Auth Flow
//!
//! 1. The chat platform's login widget gives the frontend a signed field set
//! 2. Frontend posts the fields to `/v1/auth/widget`
//! 3. Server:
//!    - Recomputes the widget HMAC ([`WidgetVerifier`])
//!    - Issues a short-lived HS256 token over the verified fields
//!      ([`TokenService`])
//! 4. Frontend sends `Authorization: Bearer <token>` on protected routes
//!
//! ## Security
//!
//! - Widget hash and token signature share one secret (the bot token)
//! - Comparisons are constant time
//! - Only HS256 headers are accepted; `iat`/`exp` are server-assigned
//! - No clock skew tolerance

pub mod claims;
pub mod error;
pub mod extractor;
pub mod token;
pub mod widget;

pub use claims::{AuthenticatedUser, ClaimSet, ClaimValue};
pub use error::AuthError;
pub use extractor::{bearer_token, Auth};
pub use token::{IssuedToken, TokenService, VerifiedToken, DEFAULT_TOKEN_TTL};
pub use widget::{data_check_string, parse_data_check_string, sign_payload, IdentityError, WidgetVerifier};
