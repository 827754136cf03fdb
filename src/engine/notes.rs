// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note operations and share grants.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::access::groups::{self as group_policy, GroupAction};
use crate::access::{
    AccessError, AccessResult, NoteAction, NoteGrant, SharePermission,
};
use crate::storage::{
    AuditEventType, GroupRepository, MembershipRepository, NoteRepository, ShareRepository,
    StoredNote, StoredShare, TxRead, UserRepository,
};

use super::{authorize_note, require_group, require_id, require_note, require_text, AccessEngine};

/// Input for [`AccessEngine::create_note`].
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub group_id: Option<String>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` detaches the note from its group
    pub group_id: Option<Option<String>>,
}

/// A note in the actor's visibility listing.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub note: StoredNote,
    /// Name of the note's group while that group is live
    pub group_name: Option<String>,
}

/// Note content with the grant that allowed reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteContent {
    pub note: StoredNote,
    pub grant: NoteGrant,
}

/// A note shared with the actor.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedNoteView {
    pub note: StoredNote,
    pub permission: SharePermission,
    pub granted_by: String,
}

/// Destination group for a note: live, and the actor manages it.
fn authorize_destination<T: TxRead>(txn: &T, group_id: &str, actor: &str) -> AccessResult<()> {
    require_group(txn, group_id)?;
    let role = MembershipRepository::new(txn).active_role(group_id, actor)?;
    // Placing a note in a group takes the same roles as managing the group.
    group_policy::authorize(GroupAction::Update, role).map_err(|_| {
        AccessError::PermissionDenied(format!(
            "owner or admin role required in group {group_id} to place notes there"
        ))
    })?;
    Ok(())
}

/// Blank group ids from clients mean "no group".
fn clean_group_id(group_id: Option<String>) -> Option<String> {
    group_id
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
}

/// Share target: a registered user other than the note's owner.
fn require_share_target<T: TxRead>(
    txn: &T,
    note: &StoredNote,
    target: &str,
) -> AccessResult<()> {
    if UserRepository::new(txn).get(target)?.is_none() {
        return Err(AccessError::not_found("user", target));
    }
    if note.owner_id.as_deref() == Some(target) {
        return Err(AccessError::InvalidState(
            "cannot share a note with its owner".to_string(),
        ));
    }
    Ok(())
}

impl AccessEngine {
    /// Create a note owned by the actor.
    ///
    /// Placing it in a group requires owner or admin there.
    pub fn create_note(&self, actor: &str, input: NewNote) -> AccessResult<StoredNote> {
        let result = self.store.write(|txn| {
            require_id("user id", actor)?;
            let title = require_text("title", &input.title)?;
            let group_id = clean_group_id(input.group_id.clone());
            if let Some(group_id) = &group_id {
                authorize_destination(txn, group_id, actor)?;
            }

            UserRepository::new(txn).ensure(actor)?;
            let note = StoredNote::new(
                actor,
                title,
                input.content.clone(),
                input.tags.clone(),
                group_id,
            );
            NoteRepository::new(txn).save(&note)?;
            Ok(note)
        });

        let note_id = result.as_ref().map(|n| n.id.clone()).unwrap_or_default();
        self.record(AuditEventType::NoteCreated, actor, "note", &note_id, &result);
        result
    }

    /// Edit a note. Write access suffices for title, content and tags;
    /// moving it between groups takes full control plus a manager role in
    /// the destination.
    pub fn update_note(
        &self,
        actor: &str,
        note_id: &str,
        patch: NotePatch,
    ) -> AccessResult<StoredNote> {
        let result = self.store.write(|txn| {
            let mut note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::Update)?;

            if let Some(requested) = patch.group_id.clone() {
                let requested = clean_group_id(requested);
                if requested != note.group_id {
                    authorize_note(txn, &note, actor, NoteAction::Reassign)?;
                    if let Some(group_id) = &requested {
                        authorize_destination(txn, group_id, actor)?;
                    }
                    note.group_id = requested;
                }
            }

            if let Some(title) = &patch.title {
                note.title = require_text("title", title)?;
            }
            if let Some(content) = &patch.content {
                note.content = content.clone();
            }
            if let Some(tags) = &patch.tags {
                note.set_tags(tags.clone());
            }
            note.updated_at = Utc::now();

            NoteRepository::new(txn).save(&note)?;
            Ok(note)
        });
        self.record(AuditEventType::NoteUpdated, actor, "note", note_id, &result);
        result
    }

    /// Soft-delete a note. Full control only; shares never allow it.
    pub fn delete_note(&self, actor: &str, note_id: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            let mut note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::Delete)?;

            note.deleted = true;
            note.updated_at = Utc::now();
            NoteRepository::new(txn).save(&note)?;
            Ok(())
        });
        self.record(AuditEventType::NoteDeleted, actor, "note", note_id, &result);
        result
    }

    /// Read a note's content. Any channel granting read suffices.
    pub fn get_note_content(&self, actor: &str, note_id: &str) -> AccessResult<NoteContent> {
        let result = self.store.read(|txn| {
            let note = require_note(txn, note_id)?;
            let grant = authorize_note(txn, &note, actor, NoteAction::Read)?;
            debug!(actor = %actor, note_id = %note_id, channel = ?grant.channel, "Note read allowed");
            Ok(NoteContent { note, grant })
        });
        self.record_read(AuditEventType::NoteRead, actor, "note", note_id, &result);
        result
    }

    /// The actor's effective permission on a note.
    pub fn check_note_access(&self, actor: &str, note_id: &str) -> AccessResult<NoteGrant> {
        let result = self.store.read(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::Read)
        });
        self.record_read(AuditEventType::NoteAccessChecked, actor, "note", note_id, &result);
        result
    }

    /// Grant `target` access to a note, replacing any existing grant.
    pub fn share_note(
        &self,
        actor: &str,
        note_id: &str,
        target: &str,
        permission: SharePermission,
    ) -> AccessResult<StoredShare> {
        let result = self.store.write(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageSharing)?;
            require_share_target(txn, &note, target)?;

            let share = StoredShare {
                note_id: note.id.clone(),
                user_id: target.to_string(),
                permission,
                granted_by: actor.to_string(),
                granted_at: Utc::now(),
            };
            ShareRepository::new(txn).save(&share)?;
            Ok(share)
        });
        self.record_with(
            AuditEventType::NoteShared,
            actor,
            "note",
            note_id,
            Some(json!({ "target": target, "permission": permission })),
            &result,
        );
        result
    }

    /// Change the permission of an existing grant.
    pub fn update_note_permissions(
        &self,
        actor: &str,
        note_id: &str,
        target: &str,
        permission: SharePermission,
    ) -> AccessResult<StoredShare> {
        let result = self.store.write(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageSharing)?;

            let shares = ShareRepository::new(txn);
            let mut share = shares
                .get(note_id, target)?
                .ok_or_else(|| AccessError::not_found("share", format!("{note_id}/{target}")))?;
            share.permission = permission;
            shares.save(&share)?;
            Ok(share)
        });
        self.record_with(
            AuditEventType::ShareUpdated,
            actor,
            "note",
            note_id,
            Some(json!({ "target": target, "permission": permission })),
            &result,
        );
        result
    }

    /// Remove `target`'s grant on a note.
    pub fn revoke_note_access(&self, actor: &str, note_id: &str, target: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageSharing)?;

            if !ShareRepository::new(txn).remove(note_id, target)? {
                return Err(AccessError::not_found("share", format!("{note_id}/{target}")));
            }
            Ok(())
        });
        self.record_with(
            AuditEventType::ShareRevoked,
            actor,
            "note",
            note_id,
            Some(json!({ "target": target })),
            &result,
        );
        result
    }

    /// Every grant on a note. Full control only.
    pub fn list_note_shares(&self, actor: &str, note_id: &str) -> AccessResult<Vec<StoredShare>> {
        let result = self.store.read(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageSharing)?;
            Ok(ShareRepository::new(txn).list_for_note(note_id)?)
        });
        self.record_read(AuditEventType::SharesListed, actor, "note", note_id, &result);
        result
    }

    /// Notes shared with the actor.
    pub fn list_shared_notes(&self, actor: &str) -> AccessResult<Vec<SharedNoteView>> {
        self.store.read(|txn| {
            let notes = NoteRepository::new(txn);
            let mut views = Vec::new();
            for share in ShareRepository::new(txn).list_for_user(actor)? {
                if let Some(note) = notes.get_live(&share.note_id)? {
                    views.push(SharedNoteView {
                        note,
                        permission: share.permission,
                        granted_by: share.granted_by,
                    });
                }
            }
            Ok(views)
        })
    }

    /// Visibility listing: notes the actor owns plus notes of every live
    /// group where the actor holds an active membership of any role.
    ///
    /// This is broader than what the actor may edit or open through
    /// [`Self::get_note_content`].
    pub fn get_user_notes(&self, actor: &str) -> AccessResult<Vec<NoteView>> {
        self.store.read(|txn| {
            let notes = NoteRepository::new(txn);
            let groups = GroupRepository::new(txn);

            let mut group_names = BTreeMap::new();
            let mut visible = BTreeMap::new();

            for membership in MembershipRepository::new(txn).list_for_user(actor)? {
                if let Some(group) = groups.get_live(&membership.group_id)? {
                    for note in notes.list_by_group(&group.id)? {
                        visible.insert(note.id.clone(), note);
                    }
                    group_names.insert(group.id.clone(), group.name);
                }
            }
            for note in notes.list_by_owner(actor)? {
                visible.insert(note.id.clone(), note);
            }

            let mut views = Vec::with_capacity(visible.len());
            for note in visible.into_values() {
                let group_name = match &note.group_id {
                    Some(gid) => match group_names.get(gid) {
                        Some(name) => Some(name.clone()),
                        None => groups.get_live(gid)?.map(|g| g.name),
                    },
                    None => None,
                };
                views.push(NoteView { note, group_name });
            }
            views.sort_by(|a, b| b.note.updated_at.cmp(&a.note.updated_at));
            Ok(views)
        })
    }
}
