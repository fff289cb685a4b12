// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet custodian: the fetch-or-create protocol over the store contracts.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::keygen::{evm_address, KeypairGenerator};
use super::CustodyError;
use crate::crypto::{self, CryptoError, DerivedKey, Envelope};
use crate::storage::records::secret_ref_for;
use crate::storage::{RecordStore, SecretStore, StoreError, StoreResult, WalletRecord};

/// Outcome of [`WalletCustodian::provision_or_fetch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProvisionedWallet {
    /// Hex-encoded uncompressed public key.
    pub public_key: String,
    /// EVM address derived from the public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Whether this call created the wallet.
    pub created: bool,
}

impl ProvisionedWallet {
    fn from_record(record: &WalletRecord, created: bool) -> Self {
        let address = hex::decode(&record.public_key)
            .ok()
            .and_then(|bytes| evm_address(&bytes));
        Self {
            public_key: record.public_key.clone(),
            address,
            created,
        }
    }
}

/// Provisions and re-authenticates custodial wallets.
///
/// Stateless apart from its collaborators; safe to share across requests.
pub struct WalletCustodian {
    records: Arc<dyn RecordStore>,
    secrets: Arc<dyn SecretStore>,
    envelope: Envelope,
    keygen: Arc<dyn KeypairGenerator>,
}

impl WalletCustodian {
    pub fn new(
        records: Arc<dyn RecordStore>,
        secrets: Arc<dyn SecretStore>,
        envelope: Envelope,
        keygen: Arc<dyn KeypairGenerator>,
    ) -> Self {
        Self {
            records,
            secrets,
            envelope,
            keygen,
        }
    }

    /// Return the wallet for `id`, creating it on first use.
    ///
    /// # Errors
    ///
    /// - [`CustodyError::InvalidRequest`] for an empty id or password
    /// - [`CustodyError::OwnershipVerificationFailed`] when `password` does
    ///   not decrypt the existing wallet
    /// - [`CustodyError::DuplicateWallet`] when a concurrent request created
    ///   the wallet between lookup and insert
    /// - [`CustodyError::MissingSecret`] when the record's secret is gone
    pub async fn provision_or_fetch(
        &self,
        id: &str,
        password: &str,
    ) -> Result<ProvisionedWallet, CustodyError> {
        if id.is_empty() || password.is_empty() {
            return Err(CustodyError::InvalidRequest("Missing ID or Password"));
        }

        let key = self.derive_key(password).await?;

        match self.records.get_record(id).await? {
            Some(record) => self.fetch(&record, &key).await,
            None => self.create(id, &key).await,
        }
    }

    /// Readiness of the record store.
    pub async fn health_check(&self) -> StoreResult<()> {
        self.records.health_check().await
    }

    /// Derivation may be Argon2id, so it runs off the async workers.
    async fn derive_key(&self, password: &str) -> Result<DerivedKey, CustodyError> {
        let envelope = self.envelope.clone();
        let password = Zeroizing::new(password.to_string());
        let key = tokio::task::spawn_blocking(move || envelope.derive_key(&password))
            .await
            .map_err(|e| CustodyError::Internal(e.to_string()))??;
        Ok(key)
    }

    async fn fetch(
        &self,
        record: &WalletRecord,
        key: &DerivedKey,
    ) -> Result<ProvisionedWallet, CustodyError> {
        let blob = self
            .secrets
            .get_secret(&record.secret_ref)
            .await?
            .ok_or_else(|| {
                tracing::error!(wallet_id = %record.id, "wallet record has no secret");
                CustodyError::MissingSecret(record.id.clone())
            })?;

        let private_key = match crypto::open(key, &blob) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(CryptoError::AuthenticationFailed) => {
                tracing::warn!(wallet_id = %record.id, "wallet ownership verification failed");
                return Err(CustodyError::OwnershipVerificationFailed);
            }
            Err(e) => return Err(e.into()),
        };
        if private_key.is_empty() {
            return Err(CustodyError::OwnershipVerificationFailed);
        }

        tracing::debug!(wallet_id = %record.id, "existing wallet verified");
        Ok(ProvisionedWallet::from_record(record, false))
    }

    async fn create(&self, id: &str, key: &DerivedKey) -> Result<ProvisionedWallet, CustodyError> {
        let keypair = self.keygen.generate()?;

        let encrypted_id = crypto::seal(key, id.as_bytes())?;
        let encrypted_private_key = crypto::seal(key, &keypair.private_key)?;

        let record = WalletRecord::new(id, hex::encode(&keypair.public_key), secret_ref_for(&encrypted_id));

        // Secret first: a crash in between orphans a secret, never a record
        self.secrets
            .put_secret(&record.secret_ref, &encrypted_private_key)
            .await?;

        match self.records.put_if_absent(&record).await {
            Ok(()) => {
                tracing::info!(wallet_id = %id, "wallet created");
                Ok(ProvisionedWallet::from_record(&record, true))
            }
            Err(StoreError::AlreadyExists(_)) => {
                tracing::warn!(wallet_id = %id, "wallet created concurrently");
                Err(CustodyError::DuplicateWallet(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for WalletCustodian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletCustodian")
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}
