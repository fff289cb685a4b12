// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store backends.
//!
//! Contents are lost on restart. Each store counts its successful writes so
//! callers can assert on write behaviour.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RecordStore, SecretStore, StoreError, StoreResult, WalletRecord};
use crate::crypto::EncryptedBlob;

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, WalletRecord>>,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of successful inserts.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_record(&self, id: &str) -> StoreResult<Option<WalletRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put_if_absent(&self, record: &WalletRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, EncryptedBlob>>,
    writes: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.secrets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.secrets.read().await.is_empty()
    }

    /// Number of successful puts, overwrites included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Remove a secret, leaving any record that points at it dangling.
    pub async fn remove(&self, secret_ref: &str) -> Option<EncryptedBlob> {
        self.secrets.write().await.remove(secret_ref)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, secret_ref: &str) -> StoreResult<Option<EncryptedBlob>> {
        Ok(self.secrets.read().await.get(secret_ref).cloned())
    }

    async fn put_secret(&self, secret_ref: &str, blob: &EncryptedBlob) -> StoreResult<()> {
        self.secrets
            .write()
            .await
            .insert(secret_ref.to_string(), blob.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
