// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM envelope: `hex(nonce || ciphertext || tag)`.

use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::kdf::{DerivedKey, KeyDerivation};
use super::CryptoError;

/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Lowercase hex encoding of `nonce || ciphertext || tag`.
///
/// Validity is only established by decrypting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for EncryptedBlob {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EncryptedBlob {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Passphrase-keyed encryption of opaque byte strings.
///
/// Cheap to clone; the key derivation function is shared.
#[derive(Clone)]
pub struct Envelope {
    kdf: Arc<dyn KeyDerivation>,
}

impl Envelope {
    pub fn new(kdf: Arc<dyn KeyDerivation>) -> Self {
        Self { kdf }
    }

    pub fn kdf_name(&self) -> &'static str {
        self.kdf.name()
    }

    /// Derive the symmetric key for `passphrase`.
    ///
    /// May be CPU-heavy (Argon2id); async callers should run it on a
    /// blocking thread and reuse the key through [`seal`] and [`open`].
    pub fn derive_key(&self, passphrase: &str) -> Result<DerivedKey, CryptoError> {
        self.kdf.derive(passphrase.as_bytes())
    }

    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<EncryptedBlob, CryptoError> {
        let key = self.derive_key(passphrase)?;
        seal(&key, plaintext)
    }

    pub fn decrypt(&self, blob: &EncryptedBlob, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
        let key = self.derive_key(passphrase)?;
        open(&key, blob)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("kdf", &self.kdf.name())
            .finish()
    }
}

fn cipher(key: &DerivedKey) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(&key[..]).map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Encrypt `plaintext` under an already derived key with a fresh nonce.
pub fn seal(key: &DerivedKey, plaintext: &[u8]) -> Result<EncryptedBlob, CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;

    let ciphertext = cipher(key)?
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(EncryptedBlob(hex::encode(out)))
}

/// Authenticate and decrypt a blob under an already derived key.
pub fn open(key: &DerivedKey, blob: &EncryptedBlob) -> Result<Vec<u8>, CryptoError> {
    let bytes = hex::decode(blob.as_str()).map_err(|_| CryptoError::MalformedBlob("not hex"))?;
    if bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::MalformedBlob("shorter than nonce and tag"));
    }

    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    cipher(key)?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Argon2Kdf, DigestKdf};

    fn envelope() -> Envelope {
        Envelope::new(Arc::new(DigestKdf))
    }

    #[test]
    fn decrypt_recovers_plaintext() {
        let env = envelope();
        let blob = env.encrypt(b"private key bytes", "pw1").unwrap();
        assert_eq!(env.decrypt(&blob, "pw1").unwrap(), b"private key bytes");
    }

    #[test]
    fn empty_plaintext_is_supported() {
        let env = envelope();
        let blob = env.encrypt(b"", "pw1").unwrap();
        assert_eq!(blob.as_str().len(), (NONCE_LEN + TAG_LEN) * 2);
        assert!(env.decrypt(&blob, "pw1").unwrap().is_empty());
    }

    #[test]
    fn blob_layout_is_lowercase_hex() {
        let blob = envelope().encrypt(b"abc", "pw1").unwrap();
        let s = blob.as_str();
        assert_eq!(s.len(), (NONCE_LEN + 3 + TAG_LEN) * 2);
        assert!(s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn nonce_is_fresh_per_call() {
        let env = envelope();
        let a = env.encrypt(b"same", "pw1").unwrap();
        let b = env.encrypt(b"same", "pw1").unwrap();
        assert_ne!(a, b);
        assert_ne!(a.as_str()[..NONCE_LEN * 2], b.as_str()[..NONCE_LEN * 2]);
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let env = envelope();
        let blob = env.encrypt(b"secret", "pw1").unwrap();
        let err = env.decrypt(&blob, "pw2").unwrap_err();
        assert!(matches!(err, CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampering_any_byte_fails_authentication() {
        let env = envelope();
        let blob = env.encrypt(b"secret", "pw1").unwrap();
        let bytes = hex::decode(blob.as_str()).unwrap();

        for i in 0..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] ^= 0x01;
            let tampered = EncryptedBlob::from(hex::encode(tampered));
            let err = env.decrypt(&tampered, "pw1").unwrap_err();
            assert!(matches!(err, CryptoError::AuthenticationFailed), "byte {i}");
        }
    }

    #[test]
    fn rejects_non_hex_and_truncated_blobs() {
        let env = envelope();
        let err = env
            .decrypt(&EncryptedBlob::from("zz".to_string()), "pw1")
            .unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBlob(_)));

        let short = EncryptedBlob::from("00".repeat(NONCE_LEN + TAG_LEN - 1));
        let err = env.decrypt(&short, "pw1").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedBlob(_)));
    }

    #[test]
    fn uppercase_hex_is_accepted() {
        let env = envelope();
        let blob = env.encrypt(b"secret", "pw1").unwrap();
        let upper = EncryptedBlob::from(blob.as_str().to_uppercase());
        assert_eq!(env.decrypt(&upper, "pw1").unwrap(), b"secret");
    }

    #[test]
    fn seal_and_open_share_a_derived_key() {
        let env = envelope();
        let key = env.derive_key("pw1").unwrap();
        let blob = seal(&key, b"one derivation").unwrap();
        assert_eq!(env.decrypt(&blob, "pw1").unwrap(), b"one derivation");
        assert_eq!(open(&key, &blob).unwrap(), b"one derivation");
    }

    #[test]
    fn argon2_envelope_round_trips() {
        let kdf = Argon2Kdf::with_params(b"deployment-salt".to_vec(), 1024, 1, 1).unwrap();
        let env = Envelope::new(Arc::new(kdf));
        let blob = env.encrypt(b"payload", "pw1").unwrap();
        assert_eq!(env.decrypt(&blob, "pw1").unwrap(), b"payload");
        assert!(envelope().decrypt(&blob, "pw1").is_err());
    }
}
