// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet keypair generation and EVM address derivation.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

/// Scalar draws before giving up. A uniformly random 32-byte string is an
/// invalid secp256k1 scalar with probability below 2^-127.
const MAX_SCALAR_ATTEMPTS: u32 = 8;

/// Length of an uncompressed SEC1 public key (`0x04 || x || y`).
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// Raw keypair bytes. The private half is wiped on drop.
pub struct Keypair {
    pub private_key: Zeroizing<Vec<u8>>,
    pub public_key: Vec<u8>,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyGenError {
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("no valid secret scalar after {0} attempts")]
    Exhausted(u32),
}

/// Source of fresh wallet keypairs.
pub trait KeypairGenerator: Send + Sync {
    fn generate(&self) -> Result<Keypair, KeyGenError>;
}

/// secp256k1 keys: 32-byte scalar, 65-byte uncompressed public key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Generator;

impl KeypairGenerator for Secp256k1Generator {
    fn generate(&self) -> Result<Keypair, KeyGenError> {
        for _ in 0..MAX_SCALAR_ATTEMPTS {
            let mut candidate = Zeroizing::new([0u8; 32]);
            OsRng
                .try_fill_bytes(&mut candidate[..])
                .map_err(|e| KeyGenError::Entropy(e.to_string()))?;

            // Zero or >= curve order; draw again
            let Ok(secret) = SecretKey::from_slice(&candidate[..]) else {
                continue;
            };

            let public_key = secret.public_key().to_encoded_point(false);
            return Ok(Keypair {
                private_key: Zeroizing::new(secret.to_bytes().to_vec()),
                public_key: public_key.as_bytes().to_vec(),
            });
        }
        Err(KeyGenError::Exhausted(MAX_SCALAR_ATTEMPTS))
    }
}

/// EVM address of an uncompressed SEC1 public key.
///
/// 1. Drop the `0x04` prefix, leaving the 64 coordinate bytes
/// 2. keccak256 the coordinates
/// 3. Keep the last 20 bytes, `0x`-prefixed lowercase hex
///
/// Returns `None` for anything that is not an uncompressed key.
pub fn evm_address(public_key: &[u8]) -> Option<String> {
    use alloy::primitives::keccak256;

    if public_key.len() != UNCOMPRESSED_PUBLIC_KEY_LEN || public_key[0] != 0x04 {
        return None;
    }
    let hash = keccak256(&public_key[1..]);
    Some(format!("0x{}", hex::encode(&hash[12..])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_uncompressed_secp256k1_keys() {
        let keypair = Secp256k1Generator.generate().unwrap();
        assert_eq!(keypair.private_key.len(), 32);
        assert_eq!(keypair.public_key.len(), UNCOMPRESSED_PUBLIC_KEY_LEN);
        assert_eq!(keypair.public_key[0], 0x04);

        // Public key must belong to the private key
        let secret = SecretKey::from_slice(&keypair.private_key).unwrap();
        assert_eq!(
            secret.public_key().to_encoded_point(false).as_bytes(),
            keypair.public_key.as_slice()
        );
    }

    #[test]
    fn keys_are_unique() {
        let a = Secp256k1Generator.generate().unwrap();
        let b = Secp256k1Generator.generate().unwrap();
        assert_ne!(*a.private_key, *b.private_key);
    }

    #[test]
    fn address_of_known_key() {
        // Private key 1 → generator point G
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        let secret = SecretKey::from_slice(&scalar).unwrap();
        let public_key = secret.public_key().to_encoded_point(false);

        assert_eq!(
            evm_address(public_key.as_bytes()).unwrap(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn address_format() {
        let keypair = Secp256k1Generator.generate().unwrap();
        let address = evm_address(&keypair.public_key).unwrap();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn address_rejects_compressed_keys() {
        let keypair = Secp256k1Generator.generate().unwrap();
        let secret = SecretKey::from_slice(&keypair.private_key).unwrap();
        let compressed = secret.public_key().to_encoded_point(true);
        assert!(evm_address(compressed.as_bytes()).is_none());
        assert!(evm_address(&[]).is_none());
    }

    #[test]
    fn debug_hides_private_key() {
        let keypair = Secp256k1Generator.generate().unwrap();
        let debug = format!("{keypair:?}");
        assert!(!debug.contains(&hex::encode(&*keypair.private_key)));
    }
}
