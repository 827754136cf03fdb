// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tag repository and note/tag links.
//!
//! Tag names are scoped per creator: `tags_by_creator` maps
//! `creator ␟ name` to the live tag id. Deleting a tag drops that entry, so a
//! later tag with the same name gets a fresh id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::OwnedResource;

use super::super::database::{composite_key, TxRead, TxWrite, NOTE_TAGS, TAGS, TAGS_BY_CREATOR};
use super::super::StorageResult;

/// Tag record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTag {
    /// Unique tag identifier (UUID)
    pub id: String,
    pub name: String,
    /// `#RRGGBB`
    pub color: String,
    pub created_by: String,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredTag {
    pub fn new(name: String, color: String, created_by: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            color,
            created_by: created_by.into(),
            deleted: false,
            created_at: Utc::now(),
        }
    }
}

impl OwnedResource for StoredTag {
    fn owner_user_id(&self) -> Option<&str> {
        Some(&self.created_by)
    }

    fn resource_kind(&self) -> &'static str {
        "tag"
    }
}

/// Repository for tags and their note links.
pub struct TagRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> TagRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    /// Get a tag unless it is soft-deleted.
    pub fn get_live(&self, tag_id: &str) -> StorageResult<Option<StoredTag>> {
        let tag: Option<StoredTag> = self.txn.get_json(TAGS, tag_id)?;
        Ok(tag.filter(|t| !t.deleted))
    }

    /// The creator's live tag with this name.
    pub fn find_by_name(&self, creator: &str, name: &str) -> StorageResult<Option<StoredTag>> {
        match self
            .txn
            .index_get(TAGS_BY_CREATOR, &composite_key(creator, name))?
        {
            Some(tag_id) => self.get_live(&tag_id),
            None => Ok(None),
        }
    }

    /// Live tags of a creator, ordered by name.
    pub fn list_for_creator(&self, creator: &str) -> StorageResult<Vec<StoredTag>> {
        self.collect_live(self.txn.index_scan(TAGS_BY_CREATOR, creator)?)
    }

    /// Live tags linked to a note.
    pub fn list_for_note(&self, note_id: &str) -> StorageResult<Vec<StoredTag>> {
        self.collect_live(self.txn.index_scan(NOTE_TAGS, note_id)?)
    }

    pub fn is_linked(&self, note_id: &str, tag_id: &str) -> StorageResult<bool> {
        Ok(self
            .txn
            .index_get(NOTE_TAGS, &composite_key(note_id, tag_id))?
            .is_some())
    }

    fn collect_live(&self, ids: Vec<String>) -> StorageResult<Vec<StoredTag>> {
        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tag) = self.get_live(&id)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }
}

impl<'a, T: TxWrite> TagRepository<'a, T> {
    pub fn insert(&self, tag: &StoredTag) -> StorageResult<()> {
        self.txn.put_json(TAGS, &tag.id, tag)?;
        self.txn.put_index(
            TAGS_BY_CREATOR,
            &composite_key(&tag.created_by, &tag.name),
            &tag.id,
        )
    }

    /// Soft-delete a tag and release its name.
    pub fn soft_delete(&self, tag: &StoredTag) -> StorageResult<()> {
        let mut tag = tag.clone();
        tag.deleted = true;
        self.txn
            .remove_index(TAGS_BY_CREATOR, &composite_key(&tag.created_by, &tag.name))?;
        self.txn.put_json(TAGS, &tag.id, &tag)
    }

    /// Link a tag to a note. Returns `false` if the link already existed.
    pub fn link(&self, note_id: &str, tag_id: &str) -> StorageResult<bool> {
        if self.is_linked(note_id, tag_id)? {
            return Ok(false);
        }
        self.txn
            .put_index(NOTE_TAGS, &composite_key(note_id, tag_id), tag_id)?;
        Ok(true)
    }

    /// Remove a link. Returns whether one existed.
    pub fn unlink(&self, note_id: &str, tag_id: &str) -> StorageResult<bool> {
        self.txn
            .remove_index(NOTE_TAGS, &composite_key(note_id, tag_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::tests::temp_store;

    fn tag(name: &str, creator: &str) -> StoredTag {
        StoredTag::new(name.into(), "#112233".into(), creator)
    }

    #[test]
    fn names_are_scoped_per_creator() {
        let (store, _dir) = temp_store();
        let mine = tag("urgent", "u1");
        let theirs = tag("urgent", "u2");
        store
            .write(|txn| -> StorageResult<()> {
                let repo = TagRepository::new(txn);
                repo.insert(&mine)?;
                repo.insert(&theirs)?;
                Ok(())
            })
            .unwrap();

        store
            .read(|txn| -> StorageResult<()> {
                let repo = TagRepository::new(txn);
                assert_eq!(repo.find_by_name("u1", "urgent")?.unwrap().id, mine.id);
                assert_eq!(repo.find_by_name("u2", "urgent")?.unwrap().id, theirs.id);
                assert!(repo.find_by_name("u3", "urgent")?.is_none());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn links_are_unique_pairs() {
        let (store, _dir) = temp_store();
        let t = tag("trail", "u1");
        store
            .write(|txn| -> StorageResult<()> {
                let repo = TagRepository::new(txn);
                repo.insert(&t)?;
                assert!(repo.link("n1", &t.id)?);
                assert!(!repo.link("n1", &t.id)?);
                assert_eq!(repo.list_for_note("n1")?.len(), 1);
                assert!(repo.unlink("n1", &t.id)?);
                assert!(!repo.unlink("n1", &t.id)?);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn soft_delete_releases_the_name() {
        let (store, _dir) = temp_store();
        let t = tag("old", "u1");
        store
            .write(|txn| -> StorageResult<()> {
                let repo = TagRepository::new(txn);
                repo.insert(&t)?;
                repo.link("n1", &t.id)?;
                repo.soft_delete(&t)?;
                assert!(repo.find_by_name("u1", "old")?.is_none());
                assert!(repo.get_live(&t.id)?.is_none());
                assert!(repo.list_for_note("n1")?.is_empty());
                assert!(repo.list_for_creator("u1")?.is_empty());
                Ok(())
            })
            .unwrap();
    }
}
