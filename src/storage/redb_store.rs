// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `wallet_records`: wallet id → serialized WalletRecord (JSON bytes)
//! - `wallet_secrets`: secret reference → hex EncryptedBlob
//!
//! redb calls block, so every operation runs on the blocking thread pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{RecordStore, SecretStore, StoreError, StoreResult, WalletRecord};
use crate::crypto::EncryptedBlob;

// =============================================================================
// Table Definitions
// =============================================================================

/// wallet id → serialized WalletRecord (JSON bytes).
const WALLET_RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallet_records");

/// secret_ref → hex EncryptedBlob.
const WALLET_SECRETS: TableDefinition<&str, &str> = TableDefinition::new("wallet_secrets");

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "wallets.redb";

// =============================================================================
// Error Conversion
// =============================================================================

macro_rules! backend_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Backend(e.to_string())
                }
            }
        )+
    };
}

backend_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// RedbStore
// =============================================================================

/// Record and secret store in a single redb file.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLET_RECORDS)?;
            let _ = write_txn.open_table(WALLET_SECRETS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "wallet database opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open `wallets.redb` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for RedbStore {
    async fn get_record(&self, id: &str) -> StoreResult<Option<WalletRecord>> {
        let id = id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(WALLET_RECORDS)?;
            match table.get(id.as_str())? {
                Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn put_if_absent(&self, record: &WalletRecord) -> StoreResult<()> {
        let record = record.clone();
        self.blocking(move |db| {
            let json = serde_json::to_vec(&record)?;
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(WALLET_RECORDS)?;
                if table.get(record.id.as_str())?.is_some() {
                    return Err(StoreError::AlreadyExists(record.id.clone()));
                }
                table.insert(record.id.as_str(), json.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(WALLET_RECORDS)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SecretStore for RedbStore {
    async fn get_secret(&self, secret_ref: &str) -> StoreResult<Option<EncryptedBlob>> {
        let secret_ref = secret_ref.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(WALLET_SECRETS)?;
            let blob = table
                .get(secret_ref.as_str())?
                .map(|value| EncryptedBlob::from(value.value().to_string()));
            Ok(blob)
        })
        .await
    }

    async fn put_secret(&self, secret_ref: &str, blob: &EncryptedBlob) -> StoreResult<()> {
        let secret_ref = secret_ref.to_string();
        let blob = blob.clone();
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(WALLET_SECRETS)?;
                table.insert(secret_ref.as_str(), blob.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }
}
