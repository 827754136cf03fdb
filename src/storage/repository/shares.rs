// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Share grant repository.
//!
//! A share is a direct grant on one note for one user. Unlike memberships,
//! revoked shares are removed outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::SharePermission;

use super::super::database::{composite_key, TxRead, TxWrite, SHARES, SHARES_BY_USER};
use super::super::StorageResult;

/// Share grant record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredShare {
    pub note_id: String,
    pub user_id: String,
    pub permission: SharePermission,
    /// User who issued the grant
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

/// Repository for share grants.
pub struct ShareRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> ShareRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    pub fn get(&self, note_id: &str, user_id: &str) -> StorageResult<Option<StoredShare>> {
        self.txn.get_json(SHARES, &composite_key(note_id, user_id))
    }

    /// All grants on a note.
    pub fn list_for_note(&self, note_id: &str) -> StorageResult<Vec<StoredShare>> {
        self.txn.scan_json(SHARES, note_id)
    }

    /// All grants held by a user.
    pub fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<StoredShare>> {
        let mut shares = Vec::new();
        for note_id in self.txn.index_scan(SHARES_BY_USER, user_id)? {
            if let Some(share) = self.get(&note_id, user_id)? {
                shares.push(share);
            }
        }
        Ok(shares)
    }
}

impl<'a, T: TxWrite> ShareRepository<'a, T> {
    /// Insert or replace the grant for the pair.
    pub fn save(&self, share: &StoredShare) -> StorageResult<()> {
        self.txn.put_json(
            SHARES,
            &composite_key(&share.note_id, &share.user_id),
            share,
        )?;
        self.txn.put_index(
            SHARES_BY_USER,
            &composite_key(&share.user_id, &share.note_id),
            &share.note_id,
        )
    }

    /// Remove the grant. Returns whether one existed.
    pub fn remove(&self, note_id: &str, user_id: &str) -> StorageResult<bool> {
        self.txn
            .remove_index(SHARES_BY_USER, &composite_key(user_id, note_id))?;
        self.txn
            .remove_json(SHARES, &composite_key(note_id, user_id))
    }
}
