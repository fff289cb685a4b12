// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Custodial Wallets
//!
//! Fetch-or-create provisioning of one wallet per caller-supplied id.
//!
//! ## Protocol
//!
//! 1. Look up the wallet record by id
//! 2. Existing record: decrypt its secret with the password. Success proves
//!    ownership and returns the stored public key; failure is
//!    [`CustodyError::OwnershipVerificationFailed`]
//! 3. No record: generate a keypair, encrypt the id and the private key
//!    under the password, write the secret, then insert the record with
//!    put-if-absent
//!
//! The password is never stored. A wrong password for an existing id never
//! creates a second wallet.
//!
//! ## Partial Failure
//!
//! Nothing is rolled back. The secret is written before the record, so an
//! interrupted creation leaves an orphaned secret rather than a record
//! without one.

pub mod keygen;
pub mod service;

pub use keygen::{evm_address, KeyGenError, Keypair, KeypairGenerator, Secp256k1Generator};
pub use service::{ProvisionedWallet, WalletCustodian};

use crate::crypto::CryptoError;
use crate::storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    /// Empty id or password.
    #[error("{0}")]
    InvalidRequest(&'static str),

    /// The password does not decrypt the existing wallet's secret.
    #[error("wallet ownership verification failed")]
    OwnershipVerificationFailed,

    /// A concurrent request created the wallet first.
    #[error("wallet already exists: {0}")]
    DuplicateWallet(String),

    /// The record exists but its secret does not.
    #[error("wallet secret missing for {0}")]
    MissingSecret(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] KeyGenError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
