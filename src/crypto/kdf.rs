// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passphrase to 256-bit key derivation.

use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::CryptoError;

/// Length of every derived key (AES-256).
pub const KEY_LEN: usize = 32;

/// A derived key, wiped from memory on drop.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Argon2id memory cost in KiB (64 MiB).
pub const ARGON2_MEMORY_KIB: u32 = 65536;

/// Argon2id iterations.
pub const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id lanes.
pub const ARGON2_PARALLELISM: u32 = 4;

/// Minimum salt length accepted by Argon2.
pub const MIN_SALT_LEN: usize = 8;

/// Turns a passphrase into a symmetric key.
///
/// Implementations must be deterministic: the same passphrase always yields
/// the same key, otherwise existing blobs become undecryptable.
pub trait KeyDerivation: Send + Sync {
    fn derive(&self, passphrase: &[u8]) -> Result<DerivedKey, CryptoError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Single SHA-256 pass over the passphrase.
///
/// Fast and unsalted, meant for tests and local development. Blobs sealed
/// under any other derivation (including MD5-based keys) cannot be opened
/// with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestKdf;

impl KeyDerivation for DigestKdf {
    fn derive(&self, passphrase: &[u8]) -> Result<DerivedKey, CryptoError> {
        let digest = Sha256::digest(passphrase);
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&digest);
        Ok(key)
    }

    fn name(&self) -> &'static str {
        "digest"
    }
}

/// Argon2id with a deployment-wide salt.
///
/// The blob format has no salt slot, so the salt is part of the
/// deployment configuration and must never change once data exists.
#[derive(Clone)]
pub struct Argon2Kdf {
    salt: Vec<u8>,
    params: Params,
}

impl Argon2Kdf {
    /// Argon2id with the production cost parameters.
    pub fn new(salt: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        Self::with_params(salt, ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM)
    }

    pub fn with_params(
        salt: impl Into<Vec<u8>>,
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, CryptoError> {
        let salt = salt.into();
        if salt.len() < MIN_SALT_LEN {
            return Err(CryptoError::KeyDerivation(format!(
                "salt must be at least {MIN_SALT_LEN} bytes"
            )));
        }
        let params = Params::new(memory_kib, iterations, parallelism, Some(KEY_LEN))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(Self { salt, params })
    }
}

impl std::fmt::Debug for Argon2Kdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Kdf")
            .field("memory_kib", &self.params.m_cost())
            .field("iterations", &self.params.t_cost())
            .field("parallelism", &self.params.p_cost())
            .finish_non_exhaustive()
    }
}

impl KeyDerivation for Argon2Kdf {
    fn derive(&self, passphrase: &[u8]) -> Result<DerivedKey, CryptoError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(passphrase, &self.salt, &mut key[..])
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }

    fn name(&self) -> &'static str {
        "argon2id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_argon2(salt: &[u8]) -> Argon2Kdf {
        Argon2Kdf::with_params(salt.to_vec(), 1024, 1, 1).unwrap()
    }

    #[test]
    fn digest_matches_sha256() {
        let key = DigestKdf.derive(b"pw1").unwrap();
        let expected = Sha256::digest(b"pw1");
        assert_eq!(&key[..], expected.as_slice());
    }

    #[test]
    fn digest_differs_per_passphrase() {
        let a = DigestKdf.derive(b"pw1").unwrap();
        let b = DigestKdf.derive(b"pw2").unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn argon2_is_deterministic() {
        let kdf = light_argon2(b"deployment-salt");
        let a = kdf.derive(b"hunter2").unwrap();
        let b = kdf.derive(b"hunter2").unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn argon2_depends_on_salt() {
        let a = light_argon2(b"salt-one-abc").derive(b"hunter2").unwrap();
        let b = light_argon2(b"salt-two-xyz").derive(b"hunter2").unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn argon2_rejects_short_salt() {
        let err = Argon2Kdf::new(b"short".to_vec()).unwrap_err();
        assert!(matches!(err, CryptoError::KeyDerivation(_)));
    }

    #[test]
    fn argon2_rejects_invalid_params() {
        assert!(Argon2Kdf::with_params(b"long-enough-salt".to_vec(), 1, 0, 1).is_err());
    }

    #[test]
    fn names() {
        assert_eq!(DigestKdf.name(), "digest");
        assert_eq!(light_argon2(b"deployment-salt").name(), "argon2id");
    }
}
