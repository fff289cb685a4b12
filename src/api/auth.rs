// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Widget login and token verification endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::audit::{AuditEvent, AuditEventType};
use crate::auth::{bearer_token, claims::SUBJECT_CLAIM, AuthError, ClaimSet, IdentityError};
use crate::error::ApiError;
use crate::models::{
    DataCheckLoginRequest, TokenResponse, VerifyTokenRequest, VerifyTokenResponse,
    WidgetLoginRequest,
};
use crate::state::AppState;

/// Exchange a verified login-widget payload for a bearer token.
#[utoipa::path(
    post,
    path = "/v1/auth/widget",
    tag = "Auth",
    request_body = WidgetLoginRequest,
    responses(
        (status = 200, description = "Payload verified, token issued", body = TokenResponse),
        (status = 400, description = "Missing hash or reserved claim supplied"),
        (status = 401, description = "Hash mismatch")
    )
)]
pub async fn widget_login(
    State(state): State<AppState>,
    Json(request): Json<WidgetLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let subject = request.data.get(SUBJECT_CLAIM).map(ToString::to_string);
    let verified = state.widget.verify(request.data);
    issue_login_token(&state, verified, subject)
}

/// Exchange a pre-built data check string and its hash for a bearer token.
///
/// Claims are parsed from the string after the hash verifies, so every
/// value comes back as text.
#[utoipa::path(
    post,
    path = "/v1/auth/data-check",
    tag = "Auth",
    request_body = DataCheckLoginRequest,
    responses(
        (status = 200, description = "String verified, token issued", body = TokenResponse),
        (status = 400, description = "Missing hash, malformed string or reserved claim supplied"),
        (status = 401, description = "Hash mismatch")
    )
)]
pub async fn data_check_login(
    State(state): State<AppState>,
    Json(request): Json<DataCheckLoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let verified = state
        .widget
        .verify_data_check_string(&request.data_check_string, &request.hash);
    let subject = verified
        .as_ref()
        .ok()
        .and_then(|claims| claims.get(SUBJECT_CLAIM))
        .map(ToString::to_string);
    issue_login_token(&state, verified, subject)
}

fn issue_login_token(
    state: &AppState,
    verified: Result<ClaimSet, IdentityError>,
    subject: Option<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = match verified {
        Ok(claims) => claims,
        Err(e) => {
            let mut event = AuditEvent::new(AuditEventType::WidgetLoginFailed).failed(e.to_string());
            if let Some(subject) = subject {
                event = event.with_user(subject);
            }
            event.emit();
            return Err(e.into());
        }
    };

    let issued = state.tokens.issue(claims)?;

    let mut event = AuditEvent::new(AuditEventType::WidgetLoginSucceeded);
    if let Some(subject) = subject {
        event = event.with_user(subject);
    }
    event.emit();

    Ok(Json(issued.into()))
}

/// Verify a bearer token and return its claims.
///
/// The token is read from `Authorization: Bearer <token>`, or from the
/// `token` field of a JSON body when the header is absent.
#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    tag = "Auth",
    request_body(content = VerifyTokenRequest, description = "Token, when no Authorization header is sent"),
    responses(
        (status = 200, description = "Token is valid", body = VerifyTokenResponse),
        (status = 401, description = "Token missing, malformed, expired or forged")
    ),
    security(("bearer_auth" = []), ())
)]
pub async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<VerifyTokenResponse>, AuthError> {
    let from_body;
    let token = match bearer_token(&headers)? {
        Some(token) => token,
        None => {
            from_body = token_from_body(&body).ok_or(AuthError::MissingToken)?;
            from_body.as_str()
        }
    };

    match state.tokens.verify(token) {
        Ok(verified) => {
            let mut event = AuditEvent::new(AuditEventType::TokenVerified);
            if let Some(subject) = verified.claims.get(SUBJECT_CLAIM) {
                event = event.with_user(subject.to_string());
            }
            event.emit();
            Ok(Json(verified.into()))
        }
        Err(e) => {
            AuditEvent::new(AuditEventType::TokenRejected)
                .failed(e.error_code())
                .emit();
            Err(e)
        }
    }
}

fn token_from_body(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    let request: VerifyTokenRequest = serde_json::from_slice(body).ok()?;
    request.token.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{sign_payload, WidgetVerifier};
    use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
    use axum::response::IntoResponse;

    const SECRET: &str = "s3cret";

    fn signed_payload() -> ClaimSet {
        let mut data = ClaimSet::new();
        data.insert("id".into(), 42i64.into());
        data.insert("first_name".into(), "Ann".into());
        let hash = sign_payload(&data, SECRET);
        data.insert("hash".into(), hash.into());
        data
    }

    #[tokio::test]
    async fn widget_login_issues_token() {
        let state = AppState::in_memory(SECRET);
        let Json(response) = widget_login(
            State(state.clone()),
            Json(WidgetLoginRequest {
                data: signed_payload(),
            }),
        )
        .await
        .unwrap();

        assert!(!response.claims.contains_key("hash"));
        assert_eq!(response.expires_at - response.issued_at, 300);
        let verified = state.tokens.verify(&response.token).unwrap();
        assert_eq!(verified.claims["id"].to_string(), "42");
    }

    #[tokio::test]
    async fn widget_login_rejects_bad_hash() {
        let mut data = signed_payload();
        data.insert("first_name".into(), "Bob".into());

        let err = widget_login(
            State(AppState::in_memory(SECRET)),
            Json(WidgetLoginRequest { data }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn data_check_login_issues_token_with_text_claims() {
        let state = AppState::in_memory(SECRET);
        let raw = "first_name=Ann\nid=42";
        let mut claims = ClaimSet::new();
        claims.insert("first_name".into(), "Ann".into());
        claims.insert("id".into(), "42".into());

        let Json(response) = data_check_login(
            State(state.clone()),
            Json(DataCheckLoginRequest {
                data_check_string: raw.into(),
                hash: sign_payload(&claims, SECRET),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.claims, claims);
        let verified = state.tokens.verify(&response.token).unwrap();
        assert_eq!(verified.claims["id"].as_str(), Some("42"));
    }

    #[tokio::test]
    async fn data_check_login_rejects_bad_hash_and_bad_string() {
        let state = AppState::in_memory(SECRET);
        let mut claims = ClaimSet::new();
        claims.insert("id".into(), "42".into());

        let err = data_check_login(
            State(state.clone()),
            Json(DataCheckLoginRequest {
                data_check_string: "id=43".into(),
                hash: sign_payload(&claims, SECRET),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        // Correctly signed, but not key=value lines
        let raw = "id=42\nnovalue";
        let hash = WidgetVerifier::new(SECRET).sign_data_check_string(raw);
        let err = data_check_login(
            State(state),
            Json(DataCheckLoginRequest {
                data_check_string: raw.into(),
                hash,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn data_check_login_rejects_reserved_claims() {
        let raw = "exp=9999999999\nid=42";
        let hash = WidgetVerifier::new(SECRET).sign_data_check_string(raw);
        let err = data_check_login(
            State(AppState::in_memory(SECRET)),
            Json(DataCheckLoginRequest {
                data_check_string: raw.into(),
                hash,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_reads_header_then_body() {
        let state = AppState::in_memory(SECRET);
        let mut claims = ClaimSet::new();
        claims.insert("id".into(), "42".into());
        let issued = state.tokens.issue(claims).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issued.token)).unwrap(),
        );
        let Json(from_header) = verify_token(State(state.clone()), headers, Bytes::new())
            .await
            .unwrap();
        assert!(from_header.verified);

        let body = Bytes::from(serde_json::to_vec(&serde_json::json!({"token": issued.token})).unwrap());
        let Json(from_body) = verify_token(State(state), HeaderMap::new(), body)
            .await
            .unwrap();
        assert_eq!(from_body.claims, from_header.claims);
        assert_eq!(from_body.expires_at, issued.expires_at);
    }

    #[tokio::test]
    async fn verify_without_token_is_unauthorized() {
        let err = verify_token(State(AppState::in_memory(SECRET)), HeaderMap::new(), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn token_from_body_ignores_garbage() {
        assert_eq!(token_from_body(b""), None);
        assert_eq!(token_from_body(b"not json"), None);
        assert_eq!(token_from_body(br#"{"token":""}"#), None);
        assert_eq!(token_from_body(br#"{"token":"abc"}"#), Some("abc".to_string()));
    }
}
