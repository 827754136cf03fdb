// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note repository.
//!
//! Notes are indexed by owner and by group so visibility listings are two
//! prefix scans. Both indexes are kept in step with the record on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::OwnedResource;
use crate::geotags::NoteStyle;

use super::super::database::{composite_key, TxRead, TxWrite, NOTES, NOTES_BY_GROUP, NOTES_BY_OWNER};
use super::super::StorageResult;

/// Note record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredNote {
    /// Unique note identifier (UUID)
    pub id: String,
    pub title: String,
    pub content: String,
    /// Raw annotations, including `lat:`/`lng:`/`col:` entries
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creator; `None` once the creator has been purged
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredNote {
    pub fn new(
        owner_id: impl Into<String>,
        title: String,
        content: String,
        tags: Vec<String>,
        group_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let style = NoteStyle::from_tags(&tags);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            content,
            tags,
            owner_id: Some(owner_id.into()),
            group_id,
            latitude: style.latitude,
            longitude: style.longitude,
            color: style.color,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the annotations and re-derive the map placement.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        let style = NoteStyle::from_tags(&tags);
        self.tags = tags;
        self.latitude = style.latitude;
        self.longitude = style.longitude;
        self.color = style.color;
    }
}

impl OwnedResource for StoredNote {
    fn owner_user_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    fn resource_kind(&self) -> &'static str {
        "note"
    }
}

/// Repository for note records.
pub struct NoteRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> NoteRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    /// Get a note, soft-deleted ones included.
    pub fn get(&self, note_id: &str) -> StorageResult<Option<StoredNote>> {
        self.txn.get_json(NOTES, note_id)
    }

    /// Get a note unless it is soft-deleted.
    pub fn get_live(&self, note_id: &str) -> StorageResult<Option<StoredNote>> {
        Ok(self.get(note_id)?.filter(|n| !n.deleted))
    }

    /// Live notes owned by a user.
    pub fn list_by_owner(&self, owner_id: &str) -> StorageResult<Vec<StoredNote>> {
        self.collect_live(self.txn.index_scan(NOTES_BY_OWNER, owner_id)?)
    }

    /// Live notes attached to a group.
    pub fn list_by_group(&self, group_id: &str) -> StorageResult<Vec<StoredNote>> {
        self.collect_live(self.txn.index_scan(NOTES_BY_GROUP, group_id)?)
    }

    fn collect_live(&self, ids: Vec<String>) -> StorageResult<Vec<StoredNote>> {
        let mut notes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(note) = self.get_live(&id)? {
                notes.push(note);
            }
        }
        Ok(notes)
    }
}

impl<'a, T: TxWrite> NoteRepository<'a, T> {
    /// Insert or update a note and move its index entries if the owner or
    /// group changed.
    pub fn save(&self, note: &StoredNote) -> StorageResult<()> {
        if let Some(previous) = self.get(&note.id)? {
            if let Some(old_owner) = previous.owner_id.filter(|o| note.owner_id.as_ref() != Some(o)) {
                self.txn
                    .remove_index(NOTES_BY_OWNER, &composite_key(&old_owner, &note.id))?;
            }
            if let Some(old_group) = previous.group_id.filter(|g| note.group_id.as_ref() != Some(g)) {
                self.txn
                    .remove_index(NOTES_BY_GROUP, &composite_key(&old_group, &note.id))?;
            }
        }

        if let Some(owner) = &note.owner_id {
            self.txn
                .put_index(NOTES_BY_OWNER, &composite_key(owner, &note.id), &note.id)?;
        }
        if let Some(group) = &note.group_id {
            self.txn
                .put_index(NOTES_BY_GROUP, &composite_key(group, &note.id), &note.id)?;
        }

        self.txn.put_json(NOTES, &note.id, note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::tests::temp_store;

    fn note(owner: &str, group: Option<&str>) -> StoredNote {
        StoredNote::new(
            owner,
            "Trailhead".into(),
            "Parking is free".into(),
            vec!["lat:49.2".into(), "col:#00ff00".into()],
            group.map(str::to_string),
        )
    }

    #[test]
    fn new_note_derives_style_from_tags() {
        let n = note("u1", None);
        assert_eq!(n.latitude, 49.2);
        assert_eq!(n.longitude, crate::geotags::DEFAULT_LONGITUDE);
        assert_eq!(n.color, "#00ff00");
    }

    #[test]
    fn indexes_follow_group_changes() {
        let (store, _dir) = temp_store();
        let mut n = note("u1", Some("g1"));

        store
            .write(|txn| NoteRepository::new(txn).save(&n))
            .unwrap();

        n.group_id = Some("g2".into());
        store
            .write(|txn| NoteRepository::new(txn).save(&n))
            .unwrap();

        store
            .read(|txn| -> StorageResult<()> {
                let repo = NoteRepository::new(txn);
                assert!(repo.list_by_group("g1")?.is_empty());
                assert_eq!(repo.list_by_group("g2")?.len(), 1);
                assert_eq!(repo.list_by_owner("u1")?.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn tombstoned_owner_drops_out_of_owner_index() {
        let (store, _dir) = temp_store();
        let mut n = note("u1", None);
        store
            .write(|txn| NoteRepository::new(txn).save(&n))
            .unwrap();

        n.owner_id = None;
        store
            .write(|txn| NoteRepository::new(txn).save(&n))
            .unwrap();

        let owned = store
            .read(|txn| NoteRepository::new(txn).list_by_owner("u1"))
            .unwrap();
        assert!(owned.is_empty());
    }

    #[test]
    fn deleted_notes_are_not_listed() {
        let (store, _dir) = temp_store();
        let mut n = note("u1", Some("g1"));
        n.deleted = true;
        store
            .write(|txn| NoteRepository::new(txn).save(&n))
            .unwrap();

        store
            .read(|txn| -> StorageResult<()> {
                let repo = NoteRepository::new(txn);
                assert!(repo.list_by_owner("u1")?.is_empty());
                assert!(repo.list_by_group("g1")?.is_empty());
                assert!(repo.get_live(&n.id)?.is_none());
                Ok(())
            })
            .unwrap();
    }
}
