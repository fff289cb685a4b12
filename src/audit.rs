// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit trail for security-relevant outcomes.
//!
//! Events go through the tracing pipeline on the `audit` target, one JSON
//! object per event, so they can be routed separately with
//! `RUST_LOG=audit=info`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracing target for audit events.
pub const AUDIT_TARGET: &str = "audit";

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Auth events
    WidgetLoginSucceeded,
    WidgetLoginFailed,
    TokenVerified,
    TokenRejected,

    // Wallet events
    WalletCreated,
    WalletAccessed,
    WalletOwnershipFailed,
    WalletCreateConflict,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Resource affected (wallet id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub success: bool,
    /// Error code if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            success: true,
            error: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Mark as failed.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Write the event to the audit target.
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if self.success {
                    tracing::info!(target: AUDIT_TARGET, event = %json, "audit");
                } else {
                    tracing::warn!(target: AUDIT_TARGET, event = %json, "audit");
                }
            }
            Err(e) => {
                tracing::error!(target: AUDIT_TARGET, error = %e, "failed to serialize audit event");
            }
        }
    }
}

/// Emit an audit event.
///
/// ```rust,ignore
/// audit_log!(AuditEventType::WalletCreated, user, "wallet", &wallet_id);
/// ```
#[macro_export]
macro_rules! audit_log {
    ($event_type:expr, $user:expr) => {{
        $crate::audit::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .emit();
    }};
    ($event_type:expr, $user:expr, $resource_type:expr, $resource_id:expr) => {{
        $crate::audit::AuditEvent::new($event_type)
            .with_user(&$user.user_id)
            .with_resource($resource_type, $resource_id)
            .emit();
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::WalletCreated)
            .with_user("42")
            .with_resource("wallet", "user1");

        assert_eq!(event.event_type, AuditEventType::WalletCreated);
        assert_eq!(event.user_id.as_deref(), Some("42"));
        assert_eq!(event.resource_type.as_deref(), Some("wallet"));
        assert_eq!(event.resource_id.as_deref(), Some("user1"));
        assert!(event.success);
        assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
    }

    #[test]
    fn failed_event_records_error() {
        let event = AuditEvent::new(AuditEventType::WidgetLoginFailed).failed("hash_mismatch");
        assert!(!event.success);
        assert_eq!(event.error.as_deref(), Some("hash_mismatch"));
    }

    #[test]
    fn serializes_snake_case_and_skips_empty_fields() {
        let event = AuditEvent::new(AuditEventType::TokenRejected);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "token_rejected");
        assert!(json.get("user_id").is_none());
        assert!(json.get("error").is_none());

        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type, AuditEventType::TokenRejected);
    }

    #[test]
    fn macro_emits_without_panicking() {
        struct User {
            user_id: String,
        }
        let user = User {
            user_id: "42".to_string(),
        };
        crate::audit_log!(AuditEventType::WalletAccessed, user, "wallet", "user1");
        crate::audit_log!(AuditEventType::TokenVerified, user);
    }
}
