// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence contracts for custodial wallets and their implementations.
//!
//! ## Contracts
//!
//! - [`RecordStore`]: wallet records by id, with an atomic put-if-absent
//! - [`SecretStore`]: encrypted private keys by secret reference
//!
//! Both are async traits shared as `Arc<dyn ..>` so the custodian never
//! knows which backend it talks to.
//!
//! ## Backends
//!
//! - [`MemoryRecordStore`] / [`MemorySecretStore`]: process-local, used in
//!   tests and when no data directory is configured
//! - [`RedbStore`]: embedded ACID database implementing both contracts
//! - [`CachedRecordStore`]: LRU read-through cache over any record store
//!
//! ## Storage Layout (redb)
//!
//! ```text
//! wallet_records:  id          -> JSON WalletRecord
//! wallet_secrets:  secret_ref  -> hex EncryptedBlob
//! ```

use async_trait::async_trait;

use crate::crypto::EncryptedBlob;

pub mod cache;
pub mod memory;
pub mod records;
pub mod redb_store;

pub use cache::CachedRecordStore;
pub use memory::{MemoryRecordStore, MemorySecretStore};
pub use records::WalletRecord;
pub use redb_store::RedbStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A conditional write found an existing entry under this key.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Wallet record persistence.
///
/// Records are immutable: there is no update or delete.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_record(&self, id: &str) -> StoreResult<Option<WalletRecord>>;

    /// Insert `record` unless a record with the same id exists.
    ///
    /// The check and the insert are atomic; the loser of a race gets
    /// [`StoreError::AlreadyExists`].
    async fn put_if_absent(&self, record: &WalletRecord) -> StoreResult<()>;

    /// Readiness probe.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Encrypted secret persistence. `put_secret` creates or overwrites.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, secret_ref: &str) -> StoreResult<Option<EncryptedBlob>>;

    async fn put_secret(&self, secret_ref: &str, blob: &EncryptedBlob) -> StoreResult<()>;
}
