// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access control engine.
//!
//! Composes the pure policy in [`crate::access`] with the repositories in
//! [`crate::storage`]. Every operation:
//!
//! 1. opens one transaction (read-only for queries, read-write for mutations)
//! 2. gathers the facts the policy needs (memberships, note, share)
//! 3. asks the policy for a verdict
//! 4. applies the mutation on allow, inside the same transaction
//!
//! A denial aborts the transaction, so nothing is written. Mutations are
//! recorded in the audit trail whatever their outcome; reads only when
//! refused.

mod groups;
mod notes;
mod tags;
mod users;

pub use groups::{GroupPatch, GroupView, MemberView, NewGroup};
pub use notes::{NewNote, NoteContent, NotePatch, NoteView, SharedNoteView};
pub use tags::NewTag;
pub use users::{ProfileUpdate, PurgeSummary};

use serde_json::Value;
use tracing::{info, warn};

use crate::access::{
    notes as note_policy, AccessError, AccessResult, NoteFacts, NoteGrant, OwnershipEnforcer,
};
use crate::storage::{
    AuditEventType, GroupRepository, MembershipRepository, NoteRepository, ShareRepository,
    Store, StoredGroup, StoredNote, TxRead,
};

/// Authorization core over the shared store.
///
/// Holds no mutable state of its own; clones share the same database.
#[derive(Debug, Clone)]
pub struct AccessEngine {
    store: Store,
}

impl AccessEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Log and audit the outcome of a mutation.
    fn record<T>(
        &self,
        event: AuditEventType,
        actor: &str,
        resource_type: &str,
        resource_id: &str,
        result: &AccessResult<T>,
    ) {
        self.record_with(event, actor, resource_type, resource_id, None, result);
    }

    /// Like [`Self::record`], attaching `details` (target user, role,
    /// permission) to the audit entry.
    fn record_with<T>(
        &self,
        event: AuditEventType,
        actor: &str,
        resource_type: &str,
        resource_id: &str,
        details: Option<Value>,
        result: &AccessResult<T>,
    ) {
        match result {
            Ok(_) => info!(
                actor = %actor,
                resource_type,
                resource_id = %resource_id,
                event = ?event,
                "Change applied"
            ),
            Err(e) if e.is_denial() => warn!(
                actor = %actor,
                resource_type,
                resource_id = %resource_id,
                event = ?event,
                code = e.error_code(),
                error = %e,
                "Change denied"
            ),
            Err(e) => warn!(
                actor = %actor,
                resource_type,
                resource_id = %resource_id,
                event = ?event,
                error = %e,
                "Change failed in store"
            ),
        }
        crate::audit_log!(
            &self.store,
            event,
            actor,
            resource_type,
            resource_id,
            outcome = result,
            details = details
        );
    }

    /// Audit a refused read. Allowed reads are only traced.
    fn record_read<T>(
        &self,
        event: AuditEventType,
        actor: &str,
        resource_type: &str,
        resource_id: &str,
        result: &AccessResult<T>,
    ) {
        let Err(e) = result else {
            return;
        };
        if !e.is_denial() {
            return;
        }
        warn!(
            actor = %actor,
            resource_type,
            resource_id = %resource_id,
            event = ?event,
            code = e.error_code(),
            error = %e,
            "Read denied"
        );
        crate::audit_log!(
            &self.store,
            event,
            actor,
            resource_type,
            resource_id,
            outcome = result
        );
    }
}

// =============================================================================
// Shared lookups
// =============================================================================

/// Live group or `NotFound`.
fn require_group<T: TxRead>(txn: &T, group_id: &str) -> AccessResult<StoredGroup> {
    GroupRepository::new(txn)
        .get_live(group_id)?
        .ok_or_else(|| AccessError::not_found("group", group_id))
}

/// Live note or `NotFound`.
fn require_note<T: TxRead>(txn: &T, note_id: &str) -> AccessResult<StoredNote> {
    NoteRepository::new(txn)
        .get_live(note_id)?
        .ok_or_else(|| AccessError::not_found("note", note_id))
}

/// Collect ownership, group and share facts about `actor` on `note`.
///
/// The group channel only counts while the note's group is live.
fn note_facts<T: TxRead>(txn: &T, note: &StoredNote, actor: &str) -> AccessResult<NoteFacts> {
    let group_role = match &note.group_id {
        Some(group_id) if GroupRepository::new(txn).get_live(group_id)?.is_some() => {
            MembershipRepository::new(txn).active_role(group_id, actor)?
        }
        _ => None,
    };
    let share = ShareRepository::new(txn)
        .get(&note.id, actor)?
        .map(|s| s.permission);

    Ok(NoteFacts {
        is_owner: note.is_owned_by(actor),
        group_role,
        share,
    })
}

/// Resolve the actor's grant on a note and authorize `action` against it.
fn authorize_note<T: TxRead>(
    txn: &T,
    note: &StoredNote,
    actor: &str,
    action: note_policy::NoteAction,
) -> AccessResult<NoteGrant> {
    let facts = note_facts(txn, note, actor)?;
    note_policy::authorize(action, note_policy::resolve(facts))
}

/// Reject blank or control-character input.
fn require_text(field: &str, value: &str) -> AccessResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccessError::InvalidState(format!("{field} must not be empty")));
    }
    if value.chars().any(char::is_control) {
        return Err(AccessError::InvalidState(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(value.to_string())
}

/// Reject identifiers that would break composite keys.
fn require_id(field: &str, value: &str) -> AccessResult<()> {
    if value.is_empty() || value.chars().any(char::is_control) {
        return Err(AccessError::InvalidState(format!("invalid {field}")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::StoragePaths;

    pub(crate) fn engine() -> (AccessEngine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&StoragePaths::new(dir.path())).unwrap();
        (AccessEngine::new(store), dir)
    }

    #[test]
    fn text_validation() {
        assert_eq!(require_text("name", "  Hikers ").unwrap(), "Hikers");
        assert!(matches!(
            require_text("name", "   "),
            Err(AccessError::InvalidState(_))
        ));
        assert!(require_text("name", "a\u{1f}b").is_err());
        assert!(require_id("user id", "auth0|123").is_ok());
        assert!(require_id("user id", "").is_err());
    }
}
