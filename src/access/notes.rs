// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note permission resolution.
//!
//! A note's authorization surface is the union of three channels:
//!
//! 1. **Ownership** - the actor created the note: full control.
//! 2. **Group** - the note belongs to a group where the actor is owner or
//!    admin: full control. Member and guest roles grant nothing here.
//! 3. **Share** - an explicit grant for the actor: `read` or `write`.
//!
//! The effective permission is the strongest grant over all channels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::{GroupRole, MANAGERS};
use super::{AccessError, AccessResult};

/// Permission level carried by a share grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Read,
    Write,
}

impl SharePermission {
    pub fn as_str(self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Write => "write",
        }
    }
}

impl FromStr for SharePermission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read" => Ok(SharePermission::Read),
            "write" => Ok(SharePermission::Write),
            other => Err(AccessError::InvalidState(format!(
                "unrecognized share permission '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for SharePermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective permission on a note, weakest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum NotePermission {
    /// View content
    Read,
    /// View and edit content
    Write,
    /// Edit, delete, manage sharing and tags
    Full,
}

impl From<SharePermission> for NotePermission {
    fn from(p: SharePermission) -> Self {
        match p {
            SharePermission::Read => NotePermission::Read,
            SharePermission::Write => NotePermission::Write,
        }
    }
}

/// Channel through which a permission was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessChannel {
    Ownership,
    Group,
    Share,
}

/// Resolved permission and the channel that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteGrant {
    pub permission: NotePermission,
    pub channel: AccessChannel,
}

/// Snapshot of everything the resolver needs about (note, actor).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteFacts {
    /// `note.owner_id == actor`
    pub is_owner: bool,
    /// Actor's active role in the note's live group, if any
    pub group_role: Option<GroupRole>,
    /// Actor's share grant on the note, if any
    pub share: Option<SharePermission>,
}

/// Merge the three channels into the strongest applicable grant.
///
/// On equal strength the earlier channel wins (ownership, group, share).
pub fn resolve(facts: NoteFacts) -> Option<NoteGrant> {
    let ownership = facts.is_owner.then_some(NoteGrant {
        permission: NotePermission::Full,
        channel: AccessChannel::Ownership,
    });

    let group = facts
        .group_role
        .filter(|role| role.satisfies(MANAGERS))
        .map(|_| NoteGrant {
            permission: NotePermission::Full,
            channel: AccessChannel::Group,
        });

    let share = facts.share.map(|p| NoteGrant {
        permission: p.into(),
        channel: AccessChannel::Share,
    });

    [ownership, group, share]
        .into_iter()
        .flatten()
        .fold(None, |best: Option<NoteGrant>, grant| match best {
            Some(b) if b.permission >= grant.permission => Some(b),
            _ => Some(grant),
        })
}

/// Note operations and the permission each one needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    /// get content, check access, list tags
    Read,
    /// edit title, content, annotations
    Update,
    /// move the note into or out of a group
    Reassign,
    Delete,
    /// share, revoke, change share permission
    ManageSharing,
    /// attach or detach tags
    ManageTags,
}

impl NoteAction {
    pub fn required(self) -> NotePermission {
        match self {
            NoteAction::Read => NotePermission::Read,
            NoteAction::Update => NotePermission::Write,
            NoteAction::Reassign
            | NoteAction::Delete
            | NoteAction::ManageSharing
            | NoteAction::ManageTags => NotePermission::Full,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteAction::Read => "read note",
            NoteAction::Update => "update note",
            NoteAction::Reassign => "reassign note",
            NoteAction::Delete => "delete note",
            NoteAction::ManageSharing => "manage note sharing",
            NoteAction::ManageTags => "manage note tags",
        }
    }
}

/// Authorize an action against a resolved grant.
pub fn authorize(action: NoteAction, grant: Option<NoteGrant>) -> AccessResult<NoteGrant> {
    match grant {
        Some(g) if g.permission >= action.required() => Ok(g),
        Some(g) => Err(AccessError::PermissionDenied(format!(
            "{}: '{:?}' access via {:?} is not enough",
            action.as_str(),
            g.permission,
            g.channel
        ))),
        None => Err(AccessError::PermissionDenied(format!(
            "{}: no access to this note",
            action.as_str()
        ))),
    }
}
