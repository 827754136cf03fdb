// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tag operations.
//!
//! Attaching or detaching a tag takes full control of the note, the same
//! test as deleting it. Tag names resolve within the actor's own catalogue
//! for both directions.

use serde_json::json;

use crate::access::{AccessError, AccessResult, NoteAction, OwnershipCheck};
use crate::geotags::{is_hex_color, DEFAULT_COLOR};
use crate::storage::{AuditEventType, StoredTag, TagRepository, UserRepository};

use super::{authorize_note, require_id, require_note, require_text, AccessEngine};

/// Input for [`AccessEngine::add_tag`].
#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub name: String,
    /// `#RRGGBB`; defaults to the map's default marker colour
    pub color: Option<String>,
}

fn validate_color(color: Option<&str>) -> AccessResult<String> {
    match color.map(str::trim) {
        None | Some("") => Ok(DEFAULT_COLOR.to_string()),
        Some(c) if is_hex_color(c) => Ok(c.to_string()),
        Some(c) => Err(AccessError::InvalidState(format!(
            "tag color '{c}' is not #RRGGBB"
        ))),
    }
}

impl AccessEngine {
    /// Attach a tag to a note by name.
    ///
    /// Reuses the actor's tag with that name if it exists, otherwise creates
    /// one. Linking an already-linked tag is a no-op.
    pub fn add_tag(&self, actor: &str, note_id: &str, input: NewTag) -> AccessResult<StoredTag> {
        let result = self.store.write(|txn| {
            require_id("user id", actor)?;
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageTags)?;
            let name = require_text("tag name", &input.name)?;

            let tags = TagRepository::new(txn);
            let tag = match tags.find_by_name(actor, &name)? {
                Some(existing) => existing,
                None => {
                    let color = validate_color(input.color.as_deref())?;
                    UserRepository::new(txn).ensure(actor)?;
                    let tag = StoredTag::new(name, color, actor);
                    tags.insert(&tag)?;
                    tag
                }
            };
            tags.link(&note.id, &tag.id)?;
            Ok(tag)
        });
        self.record_with(
            AuditEventType::TagAttached,
            actor,
            "note",
            note_id,
            Some(json!({ "tag": input.name.trim() })),
            &result,
        );
        result
    }

    /// Detach the actor's tag with this name from a note.
    ///
    /// Only the actor's own tags are considered; another user's tag with the
    /// same name is never touched.
    pub fn remove_tag(&self, actor: &str, note_id: &str, name: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::ManageTags)?;

            let tags = TagRepository::new(txn);
            let tag = tags
                .find_by_name(actor, name.trim())?
                .ok_or_else(|| AccessError::not_found("tag", name.trim()))?;
            tags.unlink(&note.id, &tag.id)?;
            Ok(())
        });
        self.record_with(
            AuditEventType::TagDetached,
            actor,
            "note",
            note_id,
            Some(json!({ "tag": name.trim() })),
            &result,
        );
        result
    }

    /// Tags linked to a note. Read access suffices.
    pub fn get_note_tags(&self, actor: &str, note_id: &str) -> AccessResult<Vec<StoredTag>> {
        let result = self.store.read(|txn| {
            let note = require_note(txn, note_id)?;
            authorize_note(txn, &note, actor, NoteAction::Read)?;
            Ok(TagRepository::new(txn).list_for_note(&note.id)?)
        });
        self.record_read(AuditEventType::NoteTagsListed, actor, "note", note_id, &result);
        result
    }

    /// The actor's live tag catalogue.
    pub fn list_tags(&self, actor: &str) -> AccessResult<Vec<StoredTag>> {
        self.store
            .read(|txn| Ok(TagRepository::new(txn).list_for_creator(actor)?))
    }

    /// Soft-delete one of the actor's tags.
    pub fn delete_tag(&self, actor: &str, tag_id: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            let tags = TagRepository::new(txn);
            let lookup = tags
                .get_live(tag_id)?
                .ok_or_else(|| AccessError::not_found("tag", tag_id));
            let tag = lookup.verify_owner(actor)?;
            tags.soft_delete(&tag)?;
            Ok(())
        });
        self.record(AuditEventType::TagDeleted, actor, "tag", tag_id, &result);
        result
    }
}
