// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group operations.

use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::access::groups::{self as policy, GroupAction, RoleChange};
use crate::access::{AccessError, AccessResult, GroupRole};
use crate::storage::{
    AuditEventType, GroupRepository, MembershipRepository, StoredGroup, StoredMembership,
    TxRead, UserRepository,
};

use super::{require_group, require_id, require_text, AccessEngine};

/// Input for [`AccessEngine::create_group`].
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub picture_url: Option<String>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some("")` clears the picture
    pub picture_url: Option<String>,
}

/// A group as seen by one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub group: StoredGroup,
    /// Actor's own active role, never anyone else's
    pub role: Option<GroupRole>,
}

/// An active member as listed to other members.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberView {
    pub membership: StoredMembership,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Validate an optional picture URL. Empty means "no picture".
fn normalize_picture_url(raw: Option<String>) -> AccessResult<Option<String>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed = url::Url::parse(raw)
        .map_err(|e| AccessError::InvalidState(format!("invalid picture_url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Some(parsed.to_string())),
        other => Err(AccessError::InvalidState(format!(
            "picture_url scheme '{other}' is not allowed"
        ))),
    }
}

fn validate_new_group(actor: &str, input: NewGroup) -> AccessResult<StoredGroup> {
    require_id("user id", actor)?;
    let name = require_text("name", &input.name)?;
    let picture_url = normalize_picture_url(input.picture_url)?;
    Ok(StoredGroup::new(
        name,
        input.description.trim().to_string(),
        picture_url,
    ))
}

/// Actor's active role in the group, authorized for `action`.
fn authorize_in<T: TxRead>(
    txn: &T,
    group_id: &str,
    actor: &str,
    action: GroupAction,
) -> AccessResult<GroupRole> {
    let role = MembershipRepository::new(txn).active_role(group_id, actor)?;
    let role = policy::authorize(action, role)?;
    debug!(actor = %actor, group_id = %group_id, role = %role, action = action.as_str(), "Group action allowed");
    Ok(role)
}

/// Target's active membership or `NotFound`.
fn require_member<T: TxRead>(
    txn: &T,
    group_id: &str,
    user_id: &str,
) -> AccessResult<StoredMembership> {
    MembershipRepository::new(txn)
        .get(group_id, user_id)?
        .filter(|m| m.active)
        .ok_or_else(|| AccessError::not_found("membership", format!("{group_id}/{user_id}")))
}

impl AccessEngine {
    /// Create a group with the actor as its sole owner.
    ///
    /// The group row and the owner membership are written in one transaction.
    pub fn create_group(&self, actor: &str, input: NewGroup) -> AccessResult<GroupView> {
        let result = validate_new_group(actor, input).and_then(|group| {
            self.store.write(|txn| {
                UserRepository::new(txn).ensure(actor)?;
                GroupRepository::new(txn).save(&group)?;
                MembershipRepository::new(txn)
                    .save(&StoredMembership::new(&group.id, actor, GroupRole::Owner))?;
                Ok(GroupView {
                    group,
                    role: Some(GroupRole::Owner),
                })
            })
        });

        let group_id = result
            .as_ref()
            .map(|v| v.group.id.clone())
            .unwrap_or_default();
        self.record(AuditEventType::GroupCreated, actor, "group", &group_id, &result);
        result
    }

    /// Public group metadata plus the actor's own role, if any.
    pub fn get_group_info(&self, actor: &str, group_id: &str) -> AccessResult<GroupView> {
        self.store.read(|txn| {
            let group = require_group(txn, group_id)?;
            let role = MembershipRepository::new(txn).active_role(group_id, actor)?;
            Ok(GroupView { group, role })
        })
    }

    /// Partial update of name, description and picture. Owner or admin.
    pub fn update_group(
        &self,
        actor: &str,
        group_id: &str,
        patch: GroupPatch,
    ) -> AccessResult<GroupView> {
        let result = self.store.write(|txn| {
            let mut group = require_group(txn, group_id)?;
            let role = authorize_in(txn, group_id, actor, GroupAction::Update)?;

            if let Some(name) = &patch.name {
                group.name = require_text("name", name)?;
            }
            if let Some(description) = &patch.description {
                group.description = description.trim().to_string();
            }
            if patch.picture_url.is_some() {
                group.picture_url = normalize_picture_url(patch.picture_url.clone())?;
            }
            group.updated_at = Utc::now();

            GroupRepository::new(txn).save(&group)?;
            Ok(GroupView {
                group,
                role: Some(role),
            })
        });
        self.record(AuditEventType::GroupUpdated, actor, "group", group_id, &result);
        result
    }

    /// Soft-delete a group. Owner only.
    pub fn delete_group(&self, actor: &str, group_id: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            let mut group = require_group(txn, group_id)?;
            authorize_in(txn, group_id, actor, GroupAction::Delete)?;

            group.deleted = true;
            group.updated_at = Utc::now();
            GroupRepository::new(txn).save(&group)?;
            Ok(())
        });
        self.record(AuditEventType::GroupDeleted, actor, "group", group_id, &result);
        result
    }

    /// Add `target` as a member, or reactivate their old membership.
    ///
    /// Adding someone who is already an active member changes nothing.
    pub fn add_member(
        &self,
        actor: &str,
        group_id: &str,
        target: &str,
    ) -> AccessResult<StoredMembership> {
        let result = self.store.write(|txn| {
            require_group(txn, group_id)?;
            authorize_in(txn, group_id, actor, GroupAction::AddMember)?;

            if UserRepository::new(txn).get(target)?.is_none() {
                return Err(AccessError::not_found("user", target));
            }

            let memberships = MembershipRepository::new(txn);
            match memberships.get(group_id, target)? {
                Some(existing) if existing.active => Ok(existing),
                Some(mut inactive) => {
                    inactive.active = true;
                    inactive.role = GroupRole::Member;
                    inactive.joined_at = Utc::now();
                    memberships.save(&inactive)?;
                    Ok(inactive)
                }
                None => {
                    let membership = StoredMembership::new(group_id, target, GroupRole::Member);
                    memberships.save(&membership)?;
                    Ok(membership)
                }
            }
        });
        self.record_with(
            AuditEventType::MemberAdded,
            actor,
            "group",
            group_id,
            Some(json!({ "target": target })),
            &result,
        );
        result
    }

    /// Deactivate `target`'s membership. The owner cannot be removed.
    pub fn remove_member(&self, actor: &str, group_id: &str, target: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            require_group(txn, group_id)?;
            let role = authorize_in(txn, group_id, actor, GroupAction::RemoveMember)?;
            let mut membership = require_member(txn, group_id, target)?;
            policy::check_member_removal(role, membership.role)?;

            membership.active = false;
            MembershipRepository::new(txn).save(&membership)?;
            Ok(())
        });
        self.record_with(
            AuditEventType::MemberRemoved,
            actor,
            "group",
            group_id,
            Some(json!({ "target": target })),
            &result,
        );
        result
    }

    /// Active members and their roles. Guests may not list.
    pub fn list_members(&self, actor: &str, group_id: &str) -> AccessResult<Vec<MemberView>> {
        let result = self.store.read(|txn| {
            require_group(txn, group_id)?;
            authorize_in(txn, group_id, actor, GroupAction::ListMembers)?;

            let users = UserRepository::new(txn);
            let mut members = Vec::new();
            for membership in MembershipRepository::new(txn).list_active(group_id)? {
                let user = users.get(&membership.user_id)?;
                members.push(MemberView {
                    email: user.as_ref().and_then(|u| u.email.clone()),
                    display_name: user.and_then(|u| u.display_name),
                    membership,
                });
            }
            Ok(members)
        });
        self.record_read(AuditEventType::MembersListed, actor, "group", group_id, &result);
        result
    }

    /// Set `target`'s role.
    ///
    /// Admins may only assign `member` or `guest`. An owner assigning `owner`
    /// hands the group over and becomes an admin, in the same transaction.
    pub fn assign_role(
        &self,
        actor: &str,
        group_id: &str,
        target: &str,
        new_role: GroupRole,
    ) -> AccessResult<StoredMembership> {
        let result: AccessResult<(StoredMembership, RoleChange)> = self.store.write(|txn| {
            require_group(txn, group_id)?;
            let role = authorize_in(txn, group_id, actor, GroupAction::AssignRole)?;
            let mut membership = require_member(txn, group_id, target)?;

            let memberships = MembershipRepository::new(txn);
            let change = policy::check_role_assignment(role, membership.role, new_role)?;
            match change {
                RoleChange::Unchanged => {}
                RoleChange::Set(role) => {
                    membership.role = role;
                    memberships.save(&membership)?;
                }
                RoleChange::TransferOwnership => {
                    let mut previous_owner = require_member(txn, group_id, actor)?;
                    previous_owner.role = GroupRole::Admin;
                    membership.role = GroupRole::Owner;
                    memberships.save(&previous_owner)?;
                    memberships.save(&membership)?;
                }
            }
            Ok((membership, change))
        });

        let event = match &result {
            Ok((_, RoleChange::TransferOwnership)) => AuditEventType::OwnershipTransferred,
            _ => AuditEventType::RoleAssigned,
        };
        let result = result.map(|(membership, _)| membership);
        self.record_with(
            event,
            actor,
            "group",
            group_id,
            Some(json!({ "target": target, "role": new_role })),
            &result,
        );
        result
    }

    /// Deactivate the actor's own membership. The owner cannot leave.
    pub fn leave_group(&self, actor: &str, group_id: &str) -> AccessResult<()> {
        let result = self.store.write(|txn| {
            require_group(txn, group_id)?;
            let mut membership = require_member(txn, group_id, actor)?;
            policy::check_leave(membership.role)?;

            membership.active = false;
            MembershipRepository::new(txn).save(&membership)?;
            Ok(())
        });
        self.record(AuditEventType::GroupLeft, actor, "group", group_id, &result);
        result
    }

    /// Live groups where the actor holds an active membership.
    pub fn get_user_groups(&self, actor: &str) -> AccessResult<Vec<GroupView>> {
        self.store.read(|txn| {
            let groups = GroupRepository::new(txn);
            let mut views = Vec::new();
            for membership in MembershipRepository::new(txn).list_for_user(actor)? {
                if let Some(group) = groups.get_live(&membership.group_id)? {
                    views.push(GroupView {
                        group,
                        role: Some(membership.role),
                    });
                }
            }
            Ok(views)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::engine;

    fn register(engine: &AccessEngine, user: &str) {
        engine
            .store()
            .write(|txn| UserRepository::new(txn).ensure(user).map(|_| ()))
            .unwrap();
    }

    fn group(engine: &AccessEngine, owner: &str) -> String {
        engine
            .create_group(
                owner,
                NewGroup {
                    name: "Hikers".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .group
            .id
    }

    fn owners(engine: &AccessEngine, group_id: &str) -> Vec<String> {
        engine
            .store()
            .read(|txn| MembershipRepository::new(txn).list_active(group_id))
            .unwrap()
            .into_iter()
            .filter(|m| m.role == GroupRole::Owner)
            .map(|m| m.user_id)
            .collect()
    }

    #[test]
    fn creator_becomes_sole_owner() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        assert_eq!(owners(&engine, &g), vec!["u1".to_string()]);

        let info = engine.get_group_info("u1", &g).unwrap();
        assert_eq!(info.role, Some(GroupRole::Owner));
    }

    #[test]
    fn blank_name_is_invalid() {
        let (engine, _dir) = engine();
        let result = engine.create_group(
            "u1",
            NewGroup {
                name: "  ".into(),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AccessError::InvalidState(_))));
    }

    #[test]
    fn picture_url_must_be_http() {
        assert_eq!(
            normalize_picture_url(Some("https://img.example.com/a.png".into())).unwrap(),
            Some("https://img.example.com/a.png".into())
        );
        assert_eq!(normalize_picture_url(Some("".into())).unwrap(), None);
        assert!(normalize_picture_url(Some("javascript:alert(1)".into())).is_err());
        assert!(normalize_picture_url(Some("not a url".into())).is_err());
    }

    #[test]
    fn group_info_is_public_but_hides_roles() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        let info = engine.get_group_info("stranger", &g).unwrap();
        assert_eq!(info.group.name, "Hikers");
        assert_eq!(info.role, None);
    }

    #[test]
    fn partial_update_preserves_unset_fields() {
        let (engine, _dir) = engine();
        let g = engine
            .create_group(
                "u1",
                NewGroup {
                    name: "Hikers".into(),
                    description: "Weekend trips".into(),
                    picture_url: Some("https://example.com/p.png".into()),
                },
            )
            .unwrap()
            .group
            .id;

        let view = engine
            .update_group(
                "u1",
                &g,
                GroupPatch {
                    name: Some("Climbers".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(view.group.name, "Climbers");
        assert_eq!(view.group.description, "Weekend trips");
        assert_eq!(
            view.group.picture_url.as_deref(),
            Some("https://example.com/p.png")
        );

        let view = engine
            .update_group(
                "u1",
                &g,
                GroupPatch {
                    picture_url: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(view.group.picture_url, None);
    }

    #[test]
    fn deleted_group_is_not_found() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();
        assert!(matches!(
            engine.delete_group("u2", &g),
            Err(AccessError::PermissionDenied(_))
        ));
        engine.delete_group("u1", &g).unwrap();

        assert!(matches!(
            engine.get_group_info("u1", &g),
            Err(AccessError::NotFound { .. })
        ));
        assert!(matches!(
            engine.delete_group("u1", &g),
            Err(AccessError::NotFound { .. })
        ));
        assert!(engine.get_user_groups("u2").unwrap().is_empty());
    }

    #[test]
    fn add_member_requires_registered_target() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        assert!(matches!(
            engine.add_member("u1", &g, "ghost"),
            Err(AccessError::NotFound { resource: "user", .. })
        ));
    }

    #[test]
    fn removed_member_is_reactivated_as_member() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();
        engine.assign_role("u1", &g, "u2", GroupRole::Admin).unwrap();
        engine.remove_member("u1", &g, "u2").unwrap();

        assert!(engine.get_user_groups("u2").unwrap().is_empty());
        assert!(matches!(
            engine.update_group("u2", &g, GroupPatch::default()),
            Err(AccessError::PermissionDenied(_))
        ));

        let m = engine.add_member("u1", &g, "u2").unwrap();
        assert!(m.active);
        assert_eq!(m.role, GroupRole::Member);
    }

    #[test]
    fn only_a_real_handover_is_audited_as_transfer() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();

        // owner re-asserting their own role changes nothing
        let same = engine.assign_role("u1", &g, "u1", GroupRole::Owner).unwrap();
        assert_eq!(same.role, GroupRole::Owner);
        engine.assign_role("u1", &g, "u2", GroupRole::Owner).unwrap();

        let events = engine
            .audit_events_for_user("u1", Utc::now().date_naive())
            .unwrap();
        let role_events: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    AuditEventType::RoleAssigned | AuditEventType::OwnershipTransferred
                )
            })
            .collect();
        assert_eq!(role_events.len(), 2);
        assert_eq!(role_events[0].event_type, AuditEventType::RoleAssigned);
        assert_eq!(role_events[1].event_type, AuditEventType::OwnershipTransferred);
        let details = role_events[1].details.as_ref().unwrap();
        assert_eq!(details["target"], "u2");
        assert_eq!(details["role"], "owner");
    }

    #[test]
    fn refused_member_listing_is_audited() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        assert!(engine.list_members("stranger", &g).is_err());

        let events = engine
            .audit_events_for_user("stranger", Utc::now().date_naive())
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::MembersListed);
        assert!(!events[0].success);
    }

    #[test]
    fn owner_cannot_be_removed() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();
        engine.assign_role("u1", &g, "u2", GroupRole::Admin).unwrap();

        assert!(matches!(
            engine.remove_member("u2", &g, "u1"),
            Err(AccessError::OwnershipConflict(_))
        ));
        assert_eq!(owners(&engine, &g), vec!["u1".to_string()]);
    }

    #[test]
    fn removing_a_non_member_is_not_found() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        assert!(matches!(
            engine.remove_member("u1", &g, "nobody"),
            Err(AccessError::NotFound { .. })
        ));
    }

    #[test]
    fn guests_cannot_list_members() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();
        assert_eq!(engine.list_members("u2", &g).unwrap().len(), 2);

        engine.assign_role("u1", &g, "u2", GroupRole::Guest).unwrap();
        assert!(matches!(
            engine.list_members("u2", &g),
            Err(AccessError::PermissionDenied(_))
        ));
        assert!(matches!(
            engine.list_members("stranger", &g),
            Err(AccessError::PermissionDenied(_))
        ));
    }

    #[test]
    fn ownership_transfer_keeps_one_owner() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        register(&engine, "u2");
        engine.add_member("u1", &g, "u2").unwrap();

        let m = engine.assign_role("u1", &g, "u2", GroupRole::Owner).unwrap();
        assert_eq!(m.role, GroupRole::Owner);
        assert_eq!(owners(&engine, &g), vec!["u2".to_string()]);

        let previous = engine.get_group_info("u1", &g).unwrap();
        assert_eq!(previous.role, Some(GroupRole::Admin));

        // the former owner may now leave
        engine.leave_group("u1", &g).unwrap();
        assert_eq!(owners(&engine, &g), vec!["u2".to_string()]);
    }

    #[test]
    fn leave_without_membership_is_not_found() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        assert!(matches!(
            engine.leave_group("u9", &g),
            Err(AccessError::NotFound { .. })
        ));
    }

    #[test]
    fn user_groups_carry_own_role() {
        let (engine, _dir) = engine();
        let g1 = group(&engine, "u1");
        let g2 = group(&engine, "u2");
        register(&engine, "u1");
        engine.add_member("u2", &g2, "u1").unwrap();

        let mut groups: Vec<_> = engine
            .get_user_groups("u1")
            .unwrap()
            .into_iter()
            .map(|v| (v.group.id, v.role))
            .collect();
        groups.sort();
        let mut expected = vec![
            (g1, Some(GroupRole::Owner)),
            (g2, Some(GroupRole::Member)),
        ];
        expected.sort();
        assert_eq!(groups, expected);
    }

    #[test]
    fn denials_are_audited() {
        let (engine, _dir) = engine();
        let g = group(&engine, "u1");
        let _ = engine.delete_group("u2", &g);

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = crate::storage::AuditRepository::new(engine.store())
            .search_by_user("u2", &today)
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::GroupDeleted);
        assert!(!events[0].success);
    }
}
