// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{TokenService, WidgetVerifier, DEFAULT_TOKEN_TTL};
use crate::config::{AppConfig, KdfConfig};
use crate::crypto::{Argon2Kdf, DigestKdf, Envelope, KeyDerivation};
use crate::custody::{Secp256k1Generator, WalletCustodian};
use crate::error::BootstrapError;
use crate::storage::{
    CachedRecordStore, MemoryRecordStore, MemorySecretStore, RecordStore, RedbStore, SecretStore,
};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub widget: Arc<WidgetVerifier>,
    pub tokens: Arc<TokenService>,
    pub custodian: Arc<WalletCustodian>,
}

impl AppState {
    pub fn new(widget: WidgetVerifier, tokens: TokenService, custodian: WalletCustodian) -> Self {
        Self {
            widget: Arc::new(widget),
            tokens: Arc::new(tokens),
            custodian: Arc::new(custodian),
        }
    }

    /// Wire every component from configuration.
    ///
    /// Opens the redb database when a data directory is configured,
    /// otherwise falls back to in-memory stores.
    pub fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        let kdf: Arc<dyn KeyDerivation> = match &config.kdf {
            KdfConfig::Argon2id { salt } => Arc::new(Argon2Kdf::new(salt.clone())?),
            KdfConfig::Digest => {
                tracing::warn!("using unsalted digest key derivation for wallet secrets");
                Arc::new(DigestKdf)
            }
        };

        let (records, secrets): (Arc<dyn RecordStore>, Arc<dyn SecretStore>) = match &config.data_dir {
            Some(dir) => {
                let db = RedbStore::open_in(dir)?;
                (Arc::new(db.clone()), Arc::new(db))
            }
            None => {
                tracing::warn!("DATA_DIR not set; wallets are kept in memory only");
                (
                    Arc::new(MemoryRecordStore::new()),
                    Arc::new(MemorySecretStore::new()),
                )
            }
        };
        let records: Arc<dyn RecordStore> = Arc::new(CachedRecordStore::new(
            records,
            config.record_cache_capacity,
            config.record_cache_ttl,
        ));

        let envelope = Envelope::new(kdf);
        tracing::info!(kdf = envelope.kdf_name(), "wallet envelope configured");

        Ok(Self::new(
            WidgetVerifier::new(&config.shared_secret),
            TokenService::new(&config.shared_secret, config.token_ttl),
            WalletCustodian::new(records, secrets, envelope, Arc::new(Secp256k1Generator)),
        ))
    }

    /// In-memory state with fast key derivation, for tests and local runs.
    pub fn in_memory(shared_secret: &str) -> Self {
        Self::new(
            WidgetVerifier::new(shared_secret),
            TokenService::new(shared_secret, DEFAULT_TOKEN_TTL),
            WalletCustodian::new(
                Arc::new(MemoryRecordStore::new()),
                Arc::new(MemorySecretStore::new()),
                Envelope::new(Arc::new(DigestKdf)),
                Arc::new(Secp256k1Generator),
            ),
        )
    }
}
