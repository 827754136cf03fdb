// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Every type derives
//! `ToSchema` for the OpenAPI document. Responses are built from engine
//! views with `From` impls so handlers stay thin.
//!
//! ## Model Categories
//!
//! - **Groups**: group metadata, members and role assignment
//! - **Notes**: note content, visibility listing and sharing
//! - **Tags**: per-creator tag catalogue
//! - **Users**: profile, purge and audit trail

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::access::{
    AccessChannel, AccessError, GroupRole, NoteGrant, NotePermission, SharePermission,
};
use crate::engine::{
    GroupPatch, GroupView, MemberView, NewGroup, NewNote, NewTag, NoteContent, NotePatch,
    NoteView, ProfileUpdate, PurgeSummary, SharedNoteView,
};
use crate::storage::{StoredMembership, StoredNote, StoredShare, StoredTag, StoredUser};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Group Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// http(s) URL of the group picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl From<CreateGroupRequest> for NewGroup {
    fn from(req: CreateGroupRequest) -> Self {
        NewGroup {
            name: req.name,
            description: req.description,
            picture_url: req.picture_url,
        }
    }
}

/// Partial update. Omitted fields are left unchanged; an empty
/// `picture_url` removes the picture.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
}

impl From<UpdateGroupRequest> for GroupPatch {
    fn from(req: UpdateGroupRequest) -> Self {
        GroupPatch {
            name: req.name,
            description: req.description,
            picture_url: req.picture_url,
        }
    }
}

/// A group as seen by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_url: Option<String>,
    /// The caller's own role; `null` for non-members
    pub role: Option<GroupRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupView> for GroupResponse {
    fn from(view: GroupView) -> Self {
        let group = view.group;
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            picture_url: group.picture_url,
            role: view.role,
            created_at: group.created_at,
            updated_at: group.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_id: String,
}

/// Role names are matched case-insensitively; anything else is rejected
/// with `invalid_state`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    #[schema(value_type = GroupRole)]
    pub role: String,
}

impl AssignRoleRequest {
    pub fn role(&self) -> Result<GroupRole, AccessError> {
        self.role.parse()
    }
}

/// A membership after a change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MembershipResponse {
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

impl From<StoredMembership> for MembershipResponse {
    fn from(m: StoredMembership) -> Self {
        Self {
            group_id: m.group_id,
            user_id: m.user_id,
            role: m.role,
            joined_at: m.joined_at,
        }
    }
}

/// An active member of a group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MemberResponse {
    pub user_id: String,
    pub role: GroupRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl From<MemberView> for MemberResponse {
    fn from(view: MemberView) -> Self {
        Self {
            user_id: view.membership.user_id,
            role: view.membership.role,
            email: view.email,
            display_name: view.display_name,
            joined_at: view.membership.joined_at,
        }
    }
}

// =============================================================================
// Note Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Free-form tags; `lat:`, `lng:` and `col:` entries position the marker
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl From<CreateNoteRequest> for NewNote {
    fn from(req: CreateNoteRequest) -> Self {
        NewNote {
            title: req.title,
            content: req.content,
            tags: req.tags,
            group_id: req.group_id,
        }
    }
}

/// Partial update. `group_id: null` moves the note out of its group.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub group_id: Option<Option<String>>,
}

impl From<UpdateNoteRequest> for NotePatch {
    fn from(req: UpdateNoteRequest) -> Self {
        NotePatch {
            title: req.title,
            content: req.content,
            tags: req.tags,
            group_id: req.group_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// `null` once the creator has been purged
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredNote> for NoteResponse {
    fn from(note: StoredNote) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            tags: note.tags,
            owner_id: note.owner_id,
            group_id: note.group_id,
            group_name: None,
            latitude: note.latitude,
            longitude: note.longitude,
            color: note.color,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

impl From<NoteView> for NoteResponse {
    fn from(view: NoteView) -> Self {
        Self {
            group_name: view.group_name,
            ..NoteResponse::from(view.note)
        }
    }
}

/// The caller's effective permission on a note.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NoteAccessResponse {
    pub note_id: String,
    pub permission: NotePermission,
    /// Ownership, group role or direct share
    pub channel: AccessChannel,
}

impl NoteAccessResponse {
    pub fn new(note_id: impl Into<String>, grant: NoteGrant) -> Self {
        Self {
            note_id: note_id.into(),
            permission: grant.permission,
            channel: grant.channel,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NoteContentResponse {
    pub note: NoteResponse,
    pub access: NoteAccessResponse,
}

impl From<NoteContent> for NoteContentResponse {
    fn from(content: NoteContent) -> Self {
        Self {
            access: NoteAccessResponse::new(content.note.id.clone(), content.grant),
            note: content.note.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareNoteRequest {
    pub user_id: String,
    #[schema(value_type = SharePermission)]
    pub permission: String,
}

impl ShareNoteRequest {
    pub fn permission(&self) -> Result<SharePermission, AccessError> {
        self.permission.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateShareRequest {
    #[schema(value_type = SharePermission)]
    pub permission: String,
}

impl UpdateShareRequest {
    pub fn permission(&self) -> Result<SharePermission, AccessError> {
        self.permission.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ShareResponse {
    pub note_id: String,
    pub user_id: String,
    pub permission: SharePermission,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

impl From<StoredShare> for ShareResponse {
    fn from(share: StoredShare) -> Self {
        Self {
            note_id: share.note_id,
            user_id: share.user_id,
            permission: share.permission,
            granted_by: share.granted_by,
            granted_at: share.granted_at,
        }
    }
}

/// A note someone shared with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SharedNoteResponse {
    pub note: NoteResponse,
    pub permission: SharePermission,
    pub granted_by: String,
}

impl From<SharedNoteView> for SharedNoteResponse {
    fn from(view: SharedNoteView) -> Self {
        Self {
            note: view.note.into(),
            permission: view.permission,
            granted_by: view.granted_by,
        }
    }
}

// =============================================================================
// Tag Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddTagRequest {
    pub name: String,
    /// `#RRGGBB`; only used when the tag is created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<AddTagRequest> for NewTag {
    fn from(req: AddTagRequest) -> Self {
        NewTag {
            name: req.name,
            color: req.color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TagResponse {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredTag> for TagResponse {
    fn from(tag: StoredTag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            created_by: tag.created_by,
            created_at: tag.created_at,
        }
    }
}

// =============================================================================
// User Models
// =============================================================================

/// Profile fields to set. A missing `email` falls back to the token's
/// `email` claim; an empty string clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SyncProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SyncProfileRequest {
    pub fn into_update(self, token_email: Option<String>) -> ProfileUpdate {
        ProfileUpdate {
            email: self.email.or(token_email),
            display_name: self.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserResponse {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PurgeResponse {
    pub notes_orphaned: usize,
    pub memberships_closed: usize,
    pub shares_removed: usize,
}

impl From<PurgeSummary> for PurgeResponse {
    fn from(s: PurgeSummary) -> Self {
        Self {
            notes_orphaned: s.notes_orphaned,
            memberships_closed: s.memberships_closed,
            shares_removed: s.shares_removed,
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Day to list (`YYYY-MM-DD`, UTC); defaults to today
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_group_id_distinguishes_null_from_absent() {
        let absent: UpdateNoteRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.group_id, None);

        let null: UpdateNoteRequest = serde_json::from_str(r#"{"group_id":null}"#).unwrap();
        assert_eq!(null.group_id, Some(None));

        let set: UpdateNoteRequest = serde_json::from_str(r#"{"group_id":"g1"}"#).unwrap();
        assert_eq!(set.group_id, Some(Some("g1".to_string())));
    }

    #[test]
    fn roles_and_permissions_parse_case_insensitively() {
        let req: AssignRoleRequest = serde_json::from_str(r#"{"role":"ADMIN"}"#).unwrap();
        assert_eq!(req.role().unwrap(), GroupRole::Admin);

        let req: ShareNoteRequest =
            serde_json::from_str(r#"{"user_id":"u2","permission":"Write"}"#).unwrap();
        assert_eq!(req.permission().unwrap(), SharePermission::Write);

        let req: AssignRoleRequest = serde_json::from_str(r#"{"role":"superuser"}"#).unwrap();
        assert!(matches!(req.role(), Err(AccessError::InvalidState(_))));

        let req: UpdateShareRequest = serde_json::from_str(r#"{"permission":"admin"}"#).unwrap();
        assert!(matches!(req.permission(), Err(AccessError::InvalidState(_))));
    }

    #[test]
    fn token_email_fills_missing_profile_email() {
        let update = SyncProfileRequest::default().into_update(Some("a@example.com".into()));
        assert_eq!(update.email.as_deref(), Some("a@example.com"));

        let update = SyncProfileRequest {
            email: Some(String::new()),
            display_name: None,
        }
        .into_update(Some("a@example.com".into()));
        assert_eq!(update.email.as_deref(), Some(""));
    }
}
