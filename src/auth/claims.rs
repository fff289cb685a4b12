// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim sets and authenticated user representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::VerifiedToken;
use super::AuthError;

/// Claim naming the authenticated user.
pub const SUBJECT_CLAIM: &str = "id";

/// Optional display name claim.
pub const USERNAME_CLAIM: &str = "username";

/// A single claim value: the widget sends strings and numbers only.
///
/// Any other JSON type fails deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Text(String),
    Number(serde_json::Number),
}

impl ClaimValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ClaimValue::Text(s) => Some(s),
            ClaimValue::Number(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ClaimValue::Number(n) => n.as_i64(),
            ClaimValue::Text(_) => None,
        }
    }
}

/// Numbers render the way the widget's browser script renders them:
/// integral floats (`1e3`, `1.0`) lose their fractional part.
impl fmt::Display for ClaimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimValue::Text(s) => f.write_str(s),
            ClaimValue::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e21 => {
                    // -0 prints as 0
                    write!(f, "{:.0}", x + 0.0)
                }
                _ => write!(f, "{n}"),
            },
        }
    }
}

impl From<&str> for ClaimValue {
    fn from(value: &str) -> Self {
        ClaimValue::Text(value.to_string())
    }
}

impl From<String> for ClaimValue {
    fn from(value: String) -> Self {
        ClaimValue::Text(value)
    }
}

impl From<i64> for ClaimValue {
    fn from(value: i64) -> Self {
        ClaimValue::Number(value.into())
    }
}

impl From<u64> for ClaimValue {
    fn from(value: u64) -> Self {
        ClaimValue::Number(value.into())
    }
}

/// Claims keyed by name, iterated in ascending byte order.
pub type ClaimSet = BTreeMap<String, ClaimValue>;

/// Authenticated user information extracted from a bearer token.
///
/// This is the primary type used throughout the application to represent
/// the authenticated user making a request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Canonical user id (the `id` claim).
    pub user_id: String,

    /// Display name, when the widget supplied one.
    pub username: Option<String>,

    /// Every verified claim, reserved ones excluded.
    pub claims: ClaimSet,

    /// Token expiration (Unix timestamp).
    pub expires_at: i64,
}

impl AuthenticatedUser {
    /// Build from a verified token. Tokens without an `id` claim carry no
    /// identity and are rejected.
    pub fn from_token(token: VerifiedToken) -> Result<Self, AuthError> {
        let user_id = token
            .claims
            .get(SUBJECT_CLAIM)
            .map(ToString::to_string)
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::MissingSubject)?;
        let username = token
            .claims
            .get(USERNAME_CLAIM)
            .and_then(ClaimValue::as_str)
            .map(str::to_string);

        Ok(Self {
            user_id,
            username,
            claims: token.claims,
            expires_at: token.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified(claims: ClaimSet) -> VerifiedToken {
        VerifiedToken {
            claims,
            issued_at: Some(1_700_000_000),
            expires_at: 1_700_000_300,
        }
    }

    #[test]
    fn deserializes_strings_and_numbers() {
        let claims: ClaimSet =
            serde_json::from_str(r#"{"id": 42, "first_name": "Ann", "auth_date": "1700000000"}"#)
                .unwrap();
        assert_eq!(claims["id"], ClaimValue::from(42i64));
        assert_eq!(claims["first_name"], ClaimValue::from("Ann"));
        assert_eq!(claims["auth_date"].as_str(), Some("1700000000"));
    }

    #[test]
    fn rejects_other_json_types() {
        for body in [
            r#"{"a": true}"#,
            r#"{"a": null}"#,
            r#"{"a": [1]}"#,
            r#"{"a": {"b": 1}}"#,
        ] {
            assert!(serde_json::from_str::<ClaimSet>(body).is_err(), "{body}");
        }
    }

    #[test]
    fn display_renders_decimal_numbers() {
        assert_eq!(ClaimValue::from(42i64).to_string(), "42");
        assert_eq!(ClaimValue::from(-7i64).to_string(), "-7");
        assert_eq!(ClaimValue::from("Ann").to_string(), "Ann");
    }

    #[test]
    fn display_drops_fraction_of_integral_floats() {
        let claims: ClaimSet =
            serde_json::from_str(r#"{"a": 1e3, "b": 1.0, "c": -0.0, "d": 1.5, "e": 1e20}"#)
                .unwrap();
        assert_eq!(claims["a"].to_string(), "1000");
        assert_eq!(claims["b"].to_string(), "1");
        assert_eq!(claims["c"].to_string(), "0");
        assert_eq!(claims["d"].to_string(), "1.5");
        assert_eq!(claims["e"].to_string(), "100000000000000000000");
    }

    #[test]
    fn from_token_extracts_user() {
        let mut claims = ClaimSet::new();
        claims.insert("id".into(), 42i64.into());
        claims.insert("username".into(), "ann".into());

        let user = AuthenticatedUser::from_token(verified(claims)).unwrap();
        assert_eq!(user.user_id, "42");
        assert_eq!(user.username.as_deref(), Some("ann"));
        assert_eq!(user.expires_at, 1_700_000_300);
    }

    #[test]
    fn from_token_requires_subject() {
        let mut claims = ClaimSet::new();
        claims.insert("first_name".into(), "Ann".into());
        let err = AuthenticatedUser::from_token(verified(claims)).unwrap_err();
        assert!(matches!(err, AuthError::MissingSubject));

        let mut claims = ClaimSet::new();
        claims.insert("id".into(), "".into());
        assert!(AuthenticatedUser::from_token(verified(claims)).is_err());
    }
}
