// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Envelope Cryptography
//!
//! Password-derived symmetric encryption for wallet secrets at rest.
//!
//! ## Blob Format
//!
//! ```text
//! hex( nonce[12] || ciphertext || gcm_tag[16] )
//! ```
//!
//! The cipher is AES-256-GCM. The 256-bit key comes from a pluggable
//! [`KeyDerivation`]: Argon2id with a deployment-wide salt in production,
//! or a single SHA-256 pass for compatibility and tests.
//!
//! ## Security
//!
//! - A fresh nonce is drawn from the OS CSPRNG for every encryption
//! - Derived keys live in [`zeroize::Zeroizing`] buffers
//! - A wrong passphrase and a tampered blob are indistinguishable
//!   ([`CryptoError::AuthenticationFailed`])

pub mod envelope;
pub mod kdf;

pub use envelope::{open, seal, EncryptedBlob, Envelope, NONCE_LEN, TAG_LEN};
pub use kdf::{Argon2Kdf, DerivedKey, DigestKdf, KeyDerivation, KEY_LEN};

/// Errors raised by envelope encryption and key derivation.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The GCM tag did not verify: wrong passphrase or tampered blob.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("malformed encrypted blob: {0}")]
    MalformedBlob(&'static str),

    /// The OS random source could not produce a nonce.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed")]
    Encryption,
}
