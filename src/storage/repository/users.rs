// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are keyed by the identity token subject. Emails are unique after
//! normalization and indexed in `user_emails`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::super::database::{TxRead, TxWrite, USERS, USER_EMAILS};
use super::super::{StorageError, StorageResult};

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Identity token subject
    pub id: String,
    /// Normalized email, unique across users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Bare record for an actor seen for the first time.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Canonical form used for email uniqueness: trimmed, NFKC, lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

/// Repository for user records.
pub struct UserRepository<'a, T> {
    txn: &'a T,
}

impl<'a, T: TxRead> UserRepository<'a, T> {
    pub fn new(txn: &'a T) -> Self {
        Self { txn }
    }

    pub fn get(&self, user_id: &str) -> StorageResult<Option<StoredUser>> {
        self.txn.get_json(USERS, user_id)
    }

    /// Look up a user by email, normalizing the input first.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        match self.txn.index_get(USER_EMAILS, &normalize_email(email))? {
            Some(user_id) => self.get(&user_id),
            None => Ok(None),
        }
    }
}

impl<'a, T: TxWrite> UserRepository<'a, T> {
    /// Return the user, inserting a bare record if none exists.
    pub fn ensure(&self, user_id: &str) -> StorageResult<StoredUser> {
        if let Some(user) = self.get(user_id)? {
            return Ok(user);
        }
        let user = StoredUser::new(user_id);
        self.txn.put_json(USERS, user_id, &user)?;
        Ok(user)
    }

    /// Write a user record, keeping the email index unique.
    ///
    /// # Errors
    /// `StorageError::Conflict` if another user already holds the email.
    pub fn save(&self, user: &StoredUser) -> StorageResult<()> {
        let previous = self.get(&user.id)?;

        if let Some(email) = &user.email {
            match self.txn.index_get(USER_EMAILS, email)? {
                Some(holder) if holder != user.id => {
                    return Err(StorageError::Conflict(format!(
                        "email {email} is already registered"
                    )));
                }
                _ => self.txn.put_index(USER_EMAILS, email, &user.id)?,
            }
        }

        if let Some(old_email) = previous.and_then(|p| p.email) {
            if user.email.as_deref() != Some(old_email.as_str()) {
                self.txn.remove_index(USER_EMAILS, &old_email)?;
            }
        }

        self.txn.put_json(USERS, &user.id, user)
    }

    /// Remove the user record and its email index entry.
    pub fn delete(&self, user_id: &str) -> StorageResult<bool> {
        let Some(user) = self.get(user_id)? else {
            return Ok(false);
        };
        if let Some(email) = &user.email {
            self.txn.remove_index(USER_EMAILS, email)?;
        }
        self.txn.remove_json(USERS, user_id)
    }
}
