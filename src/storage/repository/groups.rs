// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group repository.
//!
//! A group row carries metadata only. Who owns the group is recorded
//! exclusively as the `owner` role of a membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::database::{TxRead, TxWrite, GROUPS};
use super::super::StorageResult;

/// Group record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredGroup {
    /// Unique group identifier (UUID)
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    /// Soft-delete flag; deleted groups are never resurrected
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredGroup {
    pub fn new(name: String, description: String, picture_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            picture_url,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository for group records.
pub struct GroupRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> GroupRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    /// Get a group, soft-deleted ones included.
    pub fn get(&self, group_id: &str) -> StorageResult<Option<StoredGroup>> {
        self.txn.get_json(GROUPS, group_id)
    }

    /// Get a group unless it is soft-deleted.
    pub fn get_live(&self, group_id: &str) -> StorageResult<Option<StoredGroup>> {
        Ok(self.get(group_id)?.filter(|g| !g.deleted))
    }
}

impl<'a, T: TxWrite> GroupRepository<'a, T> {
    pub fn save(&self, group: &StoredGroup) -> StorageResult<()> {
        self.txn.put_json(GROUPS, &group.id, group)
    }
}
