// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Membership repository.
//!
//! One row per `(group, user)` pair, never deleted. Removal flips `active`
//! off; re-adding flips it back on. The `user_memberships` index lets a user's
//! groups be listed without scanning every group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::GroupRole;

use super::super::database::{composite_key, TxRead, TxWrite, MEMBERSHIPS, USER_MEMBERSHIPS};
use super::super::StorageResult;

/// Membership record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMembership {
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
}

impl StoredMembership {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>, role: GroupRole) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
            role,
            active: true,
            joined_at: Utc::now(),
        }
    }

    /// Role if the membership is active.
    pub fn effective_role(&self) -> Option<GroupRole> {
        self.active.then_some(self.role)
    }
}

/// Repository for membership records.
pub struct MembershipRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> MembershipRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    /// Membership row for the pair, active or not.
    pub fn get(&self, group_id: &str, user_id: &str) -> StorageResult<Option<StoredMembership>> {
        self.txn
            .get_json(MEMBERSHIPS, &composite_key(group_id, user_id))
    }

    /// The user's role in the group, only when the membership is active.
    pub fn active_role(&self, group_id: &str, user_id: &str) -> StorageResult<Option<GroupRole>> {
        Ok(self
            .get(group_id, user_id)?
            .and_then(|m| m.effective_role()))
    }

    /// Active memberships of a group.
    pub fn list_active(&self, group_id: &str) -> StorageResult<Vec<StoredMembership>> {
        let rows: Vec<StoredMembership> = self.txn.scan_json(MEMBERSHIPS, group_id)?;
        Ok(rows.into_iter().filter(|m| m.active).collect())
    }

    /// Active memberships of a user, across all groups.
    pub fn list_for_user(&self, user_id: &str) -> StorageResult<Vec<StoredMembership>> {
        let mut memberships = Vec::new();
        for group_id in self.txn.index_scan(USER_MEMBERSHIPS, user_id)? {
            if let Some(m) = self.get(&group_id, user_id)? {
                if m.active {
                    memberships.push(m);
                }
            }
        }
        Ok(memberships)
    }
}

impl<'a, T: TxWrite> MembershipRepository<'a, T> {
    /// Insert or overwrite the membership row for the pair.
    pub fn save(&self, membership: &StoredMembership) -> StorageResult<()> {
        let key = composite_key(&membership.group_id, &membership.user_id);
        self.txn.put_json(MEMBERSHIPS, &key, membership)?;
        self.txn.put_index(
            USER_MEMBERSHIPS,
            &composite_key(&membership.user_id, &membership.group_id),
            &membership.group_id,
        )
    }
}
