// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Bearer Tokens
//!
//! HS256 JWTs keyed by the widget shared secret.
//!
//! ## Claims
//!
//! The verified widget fields plus two server-assigned claims:
//!
//! - `iat`: issue time (Unix seconds)
//! - `exp`: `iat + ttl`
//!
//! Callers cannot supply `iat` or `exp`; issuance rejects them.
//!
//! ## Verification Order
//!
//! 1. Three base64url segments
//! 2. Header `alg` is exactly HS256
//! 3. Signature
//! 4. `exp >= now`, no leeway

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;

use super::claims::{ClaimSet, ClaimValue};
use super::AuthError;

/// Default token lifetime (5 minutes).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Issued-at claim.
pub const ISSUED_AT_CLAIM: &str = "iat";

/// Expiry claim.
pub const EXPIRY_CLAIM: &str = "exp";

/// Claims only the server may set.
pub const RESERVED_CLAIMS: [&str; 2] = [ISSUED_AT_CLAIM, EXPIRY_CLAIM];

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWT.
    pub token: String,
    /// Caller claims, reserved ones excluded.
    pub claims: ClaimSet,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Claims recovered from a valid token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    /// Caller claims, reserved ones excluded.
    pub claims: ClaimSet,
    pub issued_at: Option<i64>,
    pub expires_at: i64,
}

/// Only the algorithm is read before signature verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(shared_secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(shared_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(shared_secret.as_bytes()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `claims` with `iat = now` and `exp = now + ttl`.
    pub fn issue(&self, claims: ClaimSet) -> Result<IssuedToken, AuthError> {
        self.issue_at(claims, Utc::now().timestamp())
    }

    /// Sign `claims` as if issued at `now` (Unix seconds).
    pub fn issue_at(&self, claims: ClaimSet, now: i64) -> Result<IssuedToken, AuthError> {
        if let Some(reserved) = RESERVED_CLAIMS.iter().find(|c| claims.contains_key(**c)) {
            return Err(AuthError::ReservedClaim(*reserved));
        }

        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AuthError::InternalError("token ttl out of range".to_string()))?;
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::InternalError("token expiry overflow".to_string()))?;

        let mut signed = claims.clone();
        signed.insert(ISSUED_AT_CLAIM.to_string(), ClaimValue::from(now));
        signed.insert(EXPIRY_CLAIM.to_string(), ClaimValue::from(expires_at));

        let token = encode(&Header::new(Algorithm::HS256), &signed, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("token signing failed: {e}")))?;

        Ok(IssuedToken {
            token,
            claims,
            issued_at: now,
            expires_at,
        })
    }

    /// Verify `token` and return its claims.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let header = decode_segments(token)?;
        let header: RawHeader =
            serde_json::from_slice(&header).map_err(|_| AuthError::MalformedToken)?;
        match header.alg.as_deref() {
            Some("HS256") => {}
            Some(other) => {
                tracing::debug!(alg = %other, "token rejected: unexpected algorithm");
                return Err(AuthError::UnexpectedAlgorithm(other.to_string()));
            }
            None => return Err(AuthError::MalformedToken),
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<ClaimSet>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::UnexpectedAlgorithm("unknown".to_string()),
                _ => AuthError::MalformedToken,
            }
        })?;

        let mut claims = data.claims;
        let issued_at = claims.remove(ISSUED_AT_CLAIM).and_then(|v| v.as_i64());
        let expires_at = claims
            .remove(EXPIRY_CLAIM)
            .and_then(|v| v.as_i64())
            .ok_or(AuthError::MalformedToken)?;

        Ok(VerifiedToken {
            claims,
            issued_at,
            expires_at,
        })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Check the compact form and return the decoded header bytes.
fn decode_segments(token: &str) -> Result<Vec<u8>, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::MalformedToken);
    }

    let mut decoded = segments
        .iter()
        .map(|segment| Base64UrlUnpadded::decode_vec(segment).map_err(|_| AuthError::MalformedToken))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(decoded.swap_remove(0))
}
