// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    audit::{AuditEvent, AuditEventType},
    audit_log,
    auth::Auth,
    custody::CustodyError,
    error::ApiError,
    models::{IssueWalletRequest, WalletResponse},
    state::AppState,
};

/// Fetch the caller's custodial wallet, creating it on first use.
///
/// The wallet id must be the token's `id` claim. The password must decrypt
/// the existing wallet's private key; it is never stored.
#[utoipa::path(
    post,
    path = "/v1/wallet",
    request_body = IssueWalletRequest,
    tag = "Wallet",
    responses(
        (status = 200, description = "Existing wallet verified", body = WalletResponse),
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 400, description = "Missing id or password"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Wallet id is not the token subject, or password does not match the wallet"),
        (status = 409, description = "Wallet created concurrently")
    ),
    security(("bearer_auth" = []))
)]
pub async fn issue_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<IssueWalletRequest>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    // An empty id falls through to the custodian's 400
    if !request.id.is_empty() && request.id != user.user_id {
        tracing::warn!(user_id = %user.user_id, wallet_id = %request.id, "wallet id does not match token subject");
        AuditEvent::new(AuditEventType::WalletOwnershipFailed)
            .with_user(&user.user_id)
            .with_resource("wallet", &request.id)
            .failed("wallet id does not match token subject")
            .emit();
        return Err(ApiError::forbidden("Wallet id does not match authenticated user"));
    }

    let result = state
        .custodian
        .provision_or_fetch(&request.id, &request.password)
        .await;

    match result {
        Ok(wallet) if wallet.created => {
            audit_log!(AuditEventType::WalletCreated, user, "wallet", &request.id);
            Ok((StatusCode::CREATED, Json(wallet.into())))
        }
        Ok(wallet) => {
            audit_log!(AuditEventType::WalletAccessed, user, "wallet", &request.id);
            Ok((StatusCode::OK, Json(wallet.into())))
        }
        Err(e) => {
            let event_type = match e {
                CustodyError::OwnershipVerificationFailed => Some(AuditEventType::WalletOwnershipFailed),
                CustodyError::DuplicateWallet(_) => Some(AuditEventType::WalletCreateConflict),
                _ => None,
            };
            if let Some(event_type) = event_type {
                AuditEvent::new(event_type)
                    .with_user(&user.user_id)
                    .with_resource("wallet", &request.id)
                    .failed(e.to_string())
                    .emit();
            }
            Err(e.into())
        }
    }
}
