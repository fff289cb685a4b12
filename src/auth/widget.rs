// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Login Widget Verification
//!
//! The chat platform's login widget hands the browser a set of fields plus
//! a `hash`. The server recomputes that hash to prove the fields came from
//! the platform.
//!
//! ## Data Check String
//!
//! Every field except `hash`, as `key=value` lines sorted by key and joined
//! with `\n` (no trailing newline):
//!
//! ```text
//! first_name=Ann
//! id=42
//! ```
//!
//! ## Hash
//!
//! ```text
//! hex( HMAC-SHA256( key = SHA256(shared_secret), msg = data_check_string ) )
//! ```
//!
//! The comparison is constant time and accepts either hex case.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::claims::{ClaimSet, ClaimValue};

type HmacSha256 = Hmac<Sha256>;

/// Field carrying the widget's HMAC.
pub const HASH_FIELD: &str = "hash";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("hash is missing in authentication data")]
    MissingHash,

    #[error("verification failed: hash mismatch")]
    HashMismatch,

    #[error("malformed data check string: {0}")]
    MalformedDataCheckString(String),
}

/// Verifies login-widget payloads against the shared secret.
#[derive(Clone)]
pub struct WidgetVerifier {
    /// SHA-256 of the shared secret; the HMAC key.
    secret_key: Zeroizing<[u8; 32]>,
}

impl WidgetVerifier {
    pub fn new(shared_secret: &str) -> Self {
        let mut secret_key = Zeroizing::new([0u8; 32]);
        secret_key.copy_from_slice(&Sha256::digest(shared_secret.as_bytes()));
        Self { secret_key }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        <HmacSha256 as Mac>::new_from_slice(&self.secret_key[..])
            .expect("HMAC-SHA256 accepts a 32-byte key")
    }

    /// Verify `payload` and return it without the `hash` field.
    pub fn verify(&self, mut payload: ClaimSet) -> Result<ClaimSet, IdentityError> {
        let supplied = match payload.remove(HASH_FIELD) {
            Some(ClaimValue::Text(hash)) => hash,
            _ => return Err(IdentityError::MissingHash),
        };
        self.check(&data_check_string(&payload), &supplied)?;
        Ok(payload)
    }

    /// Verify a data check string the client already assembled, then parse
    /// it into text claims.
    ///
    /// The HMAC covers `data_check_string` byte for byte, so it is checked
    /// before any parsing or trimming.
    pub fn verify_data_check_string(
        &self,
        data_check_string: &str,
        hash: &str,
    ) -> Result<ClaimSet, IdentityError> {
        self.check(data_check_string, hash)?;
        let mut claims = parse_data_check_string(data_check_string)?;
        claims.remove(HASH_FIELD);
        Ok(claims)
    }

    fn check(&self, message: &str, supplied: &str) -> Result<(), IdentityError> {
        let supplied = supplied.trim();
        if supplied.is_empty() {
            return Err(IdentityError::MissingHash);
        }
        let supplied = hex::decode(supplied).map_err(|_| IdentityError::HashMismatch)?;

        let mut mac = self.mac();
        mac.update(message.as_bytes());
        mac.verify_slice(&supplied)
            .map_err(|_| IdentityError::HashMismatch)
    }

    /// Compute the lowercase hex hash the widget would attach to `payload`.
    pub fn sign(&self, payload: &ClaimSet) -> String {
        self.sign_data_check_string(&data_check_string(payload))
    }

    /// Lowercase hex hash over an already assembled data check string.
    pub fn sign_data_check_string(&self, data_check_string: &str) -> String {
        let mut mac = self.mac();
        mac.update(data_check_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for WidgetVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetVerifier").finish_non_exhaustive()
    }
}

/// Canonical `key=value` serialization of `claims`, `hash` excluded.
pub fn data_check_string(claims: &ClaimSet) -> String {
    claims
        .iter()
        .filter(|(key, _)| key.as_str() != HASH_FIELD)
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a data check string back into text claims.
///
/// Blank lines are skipped, each line splits at its first `=`, and keys and
/// values are trimmed.
pub fn parse_data_check_string(input: &str) -> Result<ClaimSet, IdentityError> {
    if input.is_empty() {
        return Err(IdentityError::MalformedDataCheckString(
            "empty input".to_string(),
        ));
    }

    let mut claims = ClaimSet::new();
    for line in input.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| {
            IdentityError::MalformedDataCheckString(format!("missing '=' in line: {line}"))
        })?;
        claims.insert(key.trim().to_string(), ClaimValue::from(value.trim()));
    }
    Ok(claims)
}

/// Hex hash for `claims` under `shared_secret`.
pub fn sign_payload(claims: &ClaimSet, shared_secret: &str) -> String {
    WidgetVerifier::new(shared_secret).sign(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> ClaimSet {
        let mut claims = ClaimSet::new();
        claims.insert("id".into(), "42".into());
        claims.insert("first_name".into(), "Ann".into());
        claims
    }

    fn independent_hash(message: &str, secret: &str) -> String {
        let key = Sha256::digest(secret.as_bytes());
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&key).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn canonical_string_for_known_payload() {
        assert_eq!(data_check_string(&ann()), "first_name=Ann\nid=42");
    }

    #[test]
    fn known_payload_hash_matches_hmac_of_hashed_secret() {
        let expected = independent_hash("first_name=Ann\nid=42", "s3cret");
        assert_eq!(sign_payload(&ann(), "s3cret"), expected);

        let mut payload = ann();
        payload.insert(HASH_FIELD.into(), expected.into());
        assert_eq!(WidgetVerifier::new("s3cret").verify(payload).unwrap(), ann());
    }

    #[test]
    fn canonical_string_ignores_insertion_order() {
        let pairs = [("username", "ann"), ("auth_date", "1700000000"), ("id", "42")];
        let forward: ClaimSet = pairs.iter().map(|(k, v)| (k.to_string(), (*v).into())).collect();
        let backward: ClaimSet = pairs
            .iter()
            .rev()
            .map(|(k, v)| (k.to_string(), (*v).into()))
            .collect();
        assert_eq!(data_check_string(&forward), data_check_string(&backward));
        assert_eq!(
            data_check_string(&forward),
            "auth_date=1700000000\nid=42\nusername=ann"
        );
    }

    #[test]
    fn canonical_string_excludes_hash_and_renders_numbers() {
        let mut claims = ClaimSet::new();
        claims.insert("id".into(), 42i64.into());
        claims.insert("hash".into(), "abc".into());
        assert_eq!(data_check_string(&claims), "id=42");
    }

    #[test]
    fn numeric_and_text_ids_hash_identically() {
        let mut numeric = ann();
        numeric.insert("id".into(), 42i64.into());
        assert_eq!(sign_payload(&numeric, "s3cret"), sign_payload(&ann(), "s3cret"));
    }

    #[test]
    fn missing_or_empty_hash() {
        let verifier = WidgetVerifier::new("s3cret");
        assert_eq!(verifier.verify(ann()), Err(IdentityError::MissingHash));

        let mut empty = ann();
        empty.insert(HASH_FIELD.into(), "".into());
        assert_eq!(verifier.verify(empty), Err(IdentityError::MissingHash));

        let mut numeric = ann();
        numeric.insert(HASH_FIELD.into(), 7i64.into());
        assert_eq!(verifier.verify(numeric), Err(IdentityError::MissingHash));
    }

    #[test]
    fn flipping_any_hash_character_fails() {
        let verifier = WidgetVerifier::new("s3cret");
        let hash = verifier.sign(&ann());

        for i in 0..hash.len() {
            let mut chars: Vec<char> = hash.chars().collect();
            chars[i] = if chars[i] == '0' { '1' } else { '0' };
            let mut payload = ann();
            payload.insert(HASH_FIELD.into(), chars.into_iter().collect::<String>().into());
            assert_eq!(verifier.verify(payload), Err(IdentityError::HashMismatch), "char {i}");
        }
    }

    #[test]
    fn uppercase_hash_is_accepted() {
        let verifier = WidgetVerifier::new("s3cret");
        let mut payload = ann();
        payload.insert(HASH_FIELD.into(), verifier.sign(&ann()).to_uppercase().into());
        assert!(verifier.verify(payload).is_ok());
    }

    #[test]
    fn non_hex_hash_is_a_mismatch() {
        let verifier = WidgetVerifier::new("s3cret");
        let mut payload = ann();
        payload.insert(HASH_FIELD.into(), "not-hex".into());
        assert_eq!(verifier.verify(payload), Err(IdentityError::HashMismatch));
    }

    #[test]
    fn wrong_secret_or_altered_field_fails() {
        let mut payload = ann();
        payload.insert(HASH_FIELD.into(), sign_payload(&ann(), "s3cret").into());

        let other = WidgetVerifier::new("other");
        assert_eq!(other.verify(payload.clone()), Err(IdentityError::HashMismatch));

        payload.insert("first_name".into(), "Bob".into());
        assert_eq!(
            WidgetVerifier::new("s3cret").verify(payload),
            Err(IdentityError::HashMismatch)
        );
    }

    #[test]
    fn data_check_string_login_verifies_raw_string() {
        let raw = "first_name=Ann\nid=42";
        let hash = independent_hash(raw, "s3cret");
        let verifier = WidgetVerifier::new("s3cret");

        assert_eq!(verifier.verify_data_check_string(raw, &hash).unwrap(), ann());
        assert_eq!(
            verifier.verify_data_check_string(raw, &hash.to_uppercase()).unwrap(),
            ann()
        );
    }

    #[test]
    fn data_check_string_login_is_byte_exact() {
        let raw = "first_name=Ann\nid=42";
        let hash = independent_hash(raw, "s3cret");
        let verifier = WidgetVerifier::new("s3cret");

        // Same claims after parsing, different bytes
        assert_eq!(
            verifier.verify_data_check_string("first_name = Ann\nid=42", &hash),
            Err(IdentityError::HashMismatch)
        );
        assert_eq!(
            verifier.verify_data_check_string(raw, &independent_hash(raw, "other")),
            Err(IdentityError::HashMismatch)
        );
        assert_eq!(
            verifier.verify_data_check_string(raw, "  "),
            Err(IdentityError::MissingHash)
        );
    }

    #[test]
    fn data_check_string_login_rejects_signed_garbage() {
        let raw = "id=42\nnovalue";
        let hash = independent_hash(raw, "s3cret");
        assert!(matches!(
            WidgetVerifier::new("s3cret").verify_data_check_string(raw, &hash),
            Err(IdentityError::MalformedDataCheckString(_))
        ));
    }

    #[test]
    fn canonical_string_matches_browser_rendering_of_floats() {
        let claims: ClaimSet = serde_json::from_str(r#"{"auth_date": 1e3, "x": 1.0}"#).unwrap();
        assert_eq!(data_check_string(&claims), "auth_date=1000\nx=1");
    }

    #[test]
    fn parse_round_trips_canonical_string() {
        let parsed = parse_data_check_string(&data_check_string(&ann())).unwrap();
        assert_eq!(parsed, ann());
    }

    #[test]
    fn parse_splits_on_first_equals_and_trims() {
        let parsed = parse_data_check_string(" photo_url = https://x/?a=b \n\nid=42\n").unwrap();
        assert_eq!(parsed["photo_url"].as_str(), Some("https://x/?a=b"));
        assert_eq!(parsed["id"].as_str(), Some("42"));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn parse_rejects_empty_and_unsplittable_lines() {
        assert!(matches!(
            parse_data_check_string(""),
            Err(IdentityError::MalformedDataCheckString(_))
        ));
        assert!(matches!(
            parse_data_check_string("id=42\nnovalue"),
            Err(IdentityError::MalformedDataCheckString(_))
        ));
    }
}
