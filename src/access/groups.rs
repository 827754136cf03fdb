// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group policy: role requirements and membership state transitions.
//!
//! Every function here is pure. The caller resolves the actor's effective
//! role (active membership only) and the target's membership from the store
//! and passes them in; the verdict decides whether the mutation may proceed.

use super::roles::{GroupRole, ANY_ROLE, CONTRIBUTORS, MANAGERS, OWNER_ONLY};
use super::{AccessError, AccessResult};

/// Role-gated group operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAction {
    Update,
    Delete,
    AddMember,
    RemoveMember,
    ListMembers,
    AssignRole,
    Leave,
}

impl GroupAction {
    /// Roles allowed to perform the action.
    pub fn allowed_roles(self) -> &'static [GroupRole] {
        match self {
            GroupAction::Update
            | GroupAction::AddMember
            | GroupAction::RemoveMember
            | GroupAction::AssignRole => MANAGERS,
            GroupAction::Delete => OWNER_ONLY,
            GroupAction::ListMembers => CONTRIBUTORS,
            GroupAction::Leave => ANY_ROLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupAction::Update => "update group",
            GroupAction::Delete => "delete group",
            GroupAction::AddMember => "add member",
            GroupAction::RemoveMember => "remove member",
            GroupAction::ListMembers => "list members",
            GroupAction::AssignRole => "assign role",
            GroupAction::Leave => "leave group",
        }
    }
}

/// Authorize a role-gated action for an actor with the given effective role.
///
/// Returns the effective role on success. An actor without an active
/// membership has no role and is denied.
pub fn authorize(action: GroupAction, actor_role: Option<GroupRole>) -> AccessResult<GroupRole> {
    let Some(role) = actor_role else {
        return Err(AccessError::PermissionDenied(format!(
            "{}: not a member of this group",
            action.as_str()
        )));
    };

    if role.satisfies(action.allowed_roles()) {
        Ok(role)
    } else {
        Err(AccessError::PermissionDenied(format!(
            "{}: role '{role}' is not allowed",
            action.as_str()
        )))
    }
}

/// Outcome of a permitted role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// Target already holds the role
    Unchanged,
    /// Target's role becomes the new role
    Set(GroupRole),
    /// Target becomes owner, the requesting owner steps down to admin
    TransferOwnership,
}

/// Decide a role assignment.
///
/// - admins may only grant roles below admin
/// - the owner's own membership cannot be re-roled through this path
/// - granting `owner` hands ownership over, so exactly one owner remains
pub fn check_role_assignment(
    requester: GroupRole,
    target_current: GroupRole,
    new_role: GroupRole,
) -> AccessResult<RoleChange> {
    authorize(GroupAction::AssignRole, Some(requester))?;

    if requester == GroupRole::Admin && new_role.compare(GroupRole::Admin).is_ge() {
        return Err(AccessError::OwnershipConflict(format!(
            "admins cannot promote to '{new_role}'"
        )));
    }

    if target_current == new_role {
        return Ok(RoleChange::Unchanged);
    }

    if target_current == GroupRole::Owner {
        return Err(AccessError::OwnershipConflict(
            "the owner's role cannot be reassigned".to_string(),
        ));
    }

    if new_role == GroupRole::Owner {
        return Ok(RoleChange::TransferOwnership);
    }

    Ok(RoleChange::Set(new_role))
}

/// Decide whether a member may be removed by a manager.
pub fn check_member_removal(requester: GroupRole, target: GroupRole) -> AccessResult<()> {
    authorize(GroupAction::RemoveMember, Some(requester))?;
    if target == GroupRole::Owner {
        return Err(AccessError::OwnershipConflict(
            "the group owner cannot be removed".to_string(),
        ));
    }
    Ok(())
}

/// Decide whether a member may leave.
pub fn check_leave(role: GroupRole) -> AccessResult<()> {
    authorize(GroupAction::Leave, Some(role))?;
    if role == GroupRole::Owner {
        return Err(AccessError::OwnershipConflict(
            "owner cannot leave the group; transfer ownership or delete the group".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use GroupRole::*;

    #[test]
    fn non_member_is_denied_everything() {
        for action in [
            GroupAction::Update,
            GroupAction::Delete,
            GroupAction::AddMember,
            GroupAction::RemoveMember,
            GroupAction::ListMembers,
            GroupAction::AssignRole,
            GroupAction::Leave,
        ] {
            assert!(matches!(
                authorize(action, None),
                Err(AccessError::PermissionDenied(_))
            ));
        }
    }

    #[test]
    fn role_requirements_match_operation_table() {
        assert!(authorize(GroupAction::Update, Some(Admin)).is_ok());
        assert!(authorize(GroupAction::Update, Some(Member)).is_err());
        assert!(authorize(GroupAction::Delete, Some(Owner)).is_ok());
        assert!(authorize(GroupAction::Delete, Some(Admin)).is_err());
        assert!(authorize(GroupAction::ListMembers, Some(Member)).is_ok());
        assert!(authorize(GroupAction::ListMembers, Some(Guest)).is_err());
        assert!(authorize(GroupAction::Leave, Some(Guest)).is_ok());
    }

    #[test]
    fn admin_promotion_ceiling() {
        for new_role in [Admin, Owner] {
            assert!(matches!(
                check_role_assignment(Admin, Member, new_role),
                Err(AccessError::OwnershipConflict(_))
            ));
        }
        assert_eq!(
            check_role_assignment(Admin, Member, Guest).unwrap(),
            RoleChange::Set(Guest)
        );
    }

    #[test]
    fn owner_may_grant_admin_and_owner() {
        assert_eq!(
            check_role_assignment(Owner, Member, Admin).unwrap(),
            RoleChange::Set(Admin)
        );
        assert_eq!(
            check_role_assignment(Owner, Admin, Owner).unwrap(),
            RoleChange::TransferOwnership
        );
    }

    #[test]
    fn owner_membership_cannot_be_demoted() {
        assert!(matches!(
            check_role_assignment(Owner, Owner, Member),
            Err(AccessError::OwnershipConflict(_))
        ));
        assert!(matches!(
            check_role_assignment(Admin, Owner, Guest),
            Err(AccessError::OwnershipConflict(_))
        ));
        assert_eq!(
            check_role_assignment(Owner, Owner, Owner).unwrap(),
            RoleChange::Unchanged
        );
    }

    #[test]
    fn members_cannot_assign_roles() {
        assert!(matches!(
            check_role_assignment(Member, Guest, Guest),
            Err(AccessError::PermissionDenied(_))
        ));
    }

    #[test]
    fn owner_cannot_leave_or_be_removed() {
        assert!(matches!(check_leave(Owner), Err(AccessError::OwnershipConflict(_))));
        assert!(check_leave(Guest).is_ok());
        assert!(matches!(
            check_member_removal(Admin, Owner),
            Err(AccessError::OwnershipConflict(_))
        ));
        assert!(check_member_removal(Admin, Admin).is_ok());
        assert!(matches!(
            check_member_removal(Member, Guest),
            Err(AccessError::PermissionDenied(_))
        ));
    }
}
