// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{ClaimSet, IssuedToken, VerifiedToken};
use crate::custody::ProvisionedWallet;

/// Login-widget payload as received by the frontend.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WidgetLoginRequest {
    /// Widget fields including `hash`. Values are strings or numbers.
    #[schema(value_type = Object)]
    pub data: ClaimSet,
}

/// Login with a data check string the frontend already assembled.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DataCheckLoginRequest {
    /// Sorted `key=value` lines joined by `\n`, `hash` excluded.
    pub data_check_string: String,
    /// Hex HMAC over `data_check_string`.
    pub hash: String,
}

/// A signed bearer token and the claims it carries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    /// Unix seconds.
    pub issued_at: i64,
    /// Unix seconds.
    pub expires_at: i64,
    #[schema(value_type = Object)]
    pub claims: ClaimSet,
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
            claims: issued.claims,
        }
    }
}

/// Token to verify when no `Authorization` header is sent.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyTokenResponse {
    pub verified: bool,
    #[schema(value_type = Object)]
    pub claims: ClaimSet,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
    /// Unix seconds.
    pub expires_at: i64,
}

impl From<VerifiedToken> for VerifyTokenResponse {
    fn from(token: VerifiedToken) -> Self {
        Self {
            verified: true,
            claims: token.claims,
            issued_at: token.issued_at,
            expires_at: token.expires_at,
        }
    }
}

/// Wallet id and the password protecting its private key.
#[derive(Clone, Deserialize, ToSchema)]
pub struct IssueWalletRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for IssueWalletRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueWalletRequest")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletResponse {
    /// Hex-encoded uncompressed secp256k1 public key.
    pub public_key: String,
    /// EVM address of the public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// True when this request created the wallet.
    pub created: bool,
}

impl From<ProvisionedWallet> for WalletResponse {
    fn from(wallet: ProvisionedWallet) -> Self {
        Self {
            public_key: wallet.public_key,
            address: wallet.address,
            created: wallet.created,
        }
    }
}
