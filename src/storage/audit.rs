// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit trail for state changes and access denials.
//!
//! Every mutation the engine applies or refuses, and every refused read, is
//! appended to the `audit_events` table. Events are keyed by day so a
//! single day can be read with one prefix scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{composite_key, TxRead, TxWrite, AUDIT_EVENTS};
use super::{Store, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Group events
    GroupCreated,
    GroupUpdated,
    GroupDeleted,
    MemberAdded,
    MemberRemoved,
    RoleAssigned,
    OwnershipTransferred,
    GroupLeft,

    // Note events
    NoteCreated,
    NoteUpdated,
    NoteDeleted,
    NoteShared,
    ShareUpdated,
    ShareRevoked,

    // Tag events
    TagAttached,
    TagDetached,
    TagDeleted,

    // User events
    ProfileSynced,
    UserPurged,

    // Reads, recorded only when refused
    NoteRead,
    NoteAccessChecked,
    SharesListed,
    MembersListed,
    NoteTagsListed,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Acting user.
    pub user_id: Option<String>,
    /// Resource affected (group_id, note_id, tag_id).
    pub resource_id: Option<String>,
    /// Resource type (group, note, tag, user).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation was applied.
    pub success: bool,
    /// Denial or failure reason.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    fn storage_key(&self) -> String {
        let day = self.timestamp.format("%Y-%m-%d").to_string();
        let micros = self.timestamp.timestamp_micros().max(0) as u64;
        composite_key(&day, &composite_key(&format!("{micros:020}"), &self.event_id))
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    store: &'a Store,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Append an audit event in its own write transaction.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        self.store
            .write(|txn| txn.put_json(AUDIT_EVENTS, &event.storage_key(), event))
    }

    /// Read audit events for a specific date (`YYYY-MM-DD`), oldest first.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        self.store.read(|txn| txn.scan_json(AUDIT_EVENTS, date))
    }

    /// Events triggered by one user on a given date.
    pub fn search_by_user(&self, user_id: &str, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let events = self.read_events(date)?;
        Ok(events
            .into_iter()
            .filter(|e| e.user_id.as_deref() == Some(user_id))
            .collect())
    }
}

/// Helper macro for logging audit events.
///
/// Audit failures never fail the audited operation; they are logged and
/// dropped. The event is marked failed when `outcome` is an error.
#[macro_export]
macro_rules! audit_log {
    ($store:expr, $event_type:expr, $actor:expr, $resource_type:expr, $resource_id:expr, outcome = $result:expr, details = $details:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let mut event = $crate::storage::AuditEvent::new($event_type)
            .with_user($actor)
            .with_resource($resource_type, $resource_id);
        let details: Option<::serde_json::Value> = $details;
        if let Some(details) = details {
            event = event.with_details(details);
        }
        if let Err(err) = &$result {
            event = event.failed(err.to_string());
        }
        if let Err(e) = repo.log(&event) {
            tracing::warn!(error = %e, "Failed to write audit event");
        }
    }};
    ($store:expr, $event_type:expr, $actor:expr, $resource_type:expr, $resource_id:expr, outcome = $result:expr) => {
        $crate::audit_log!(
            $store,
            $event_type,
            $actor,
            $resource_type,
            $resource_id,
            outcome = $result,
            details = None
        )
    };
}
