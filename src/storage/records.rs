// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};

use crate::crypto::EncryptedBlob;

/// Prefix of every secret reference.
pub const SECRET_REF_PREFIX: &str = "/wallets/private/";

/// Persisted wallet record. Created once per id and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Caller-supplied opaque identifier.
    pub id: String,
    /// Hex-encoded uncompressed public key.
    pub public_key: String,
    /// Key of the encrypted private key in the secret store.
    pub secret_ref: String,
}

impl WalletRecord {
    pub fn new(id: impl Into<String>, public_key: impl Into<String>, secret_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            public_key: public_key.into(),
            secret_ref: secret_ref.into(),
        }
    }
}

/// Secret reference derived from the encrypted wallet id.
pub fn secret_ref_for(encrypted_id: &EncryptedBlob) -> String {
    format!("{SECRET_REF_PREFIX}{encrypted_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_ref_prefixes_encrypted_id() {
        let blob = EncryptedBlob::from("abcdef".to_string());
        assert_eq!(secret_ref_for(&blob), "/wallets/private/abcdef");
    }

    #[test]
    fn record_serializes_with_stable_field_names() {
        let record = WalletRecord::new("user1", "04ab", "/wallets/private/00");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "user1");
        assert_eq!(json["public_key"], "04ab");
        assert_eq!(json["secret_ref"], "/wallets/private/00");
    }
}
