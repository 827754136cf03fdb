// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group roles and the ordering used for promotion limits.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AccessError;

/// Role held by a member inside a group.
///
/// ## Role Lattice
///
/// `Owner > Admin > Member > Guest`. The ordering only drives promotion
/// limits; permission checks use explicit allow-lists (see [`GroupRole::satisfies`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    /// Sole owner of the group
    Owner,
    /// Manages members and group metadata
    Admin,
    /// Regular member
    Member,
    /// Limited member, excluded from most operations
    Guest,
}

/// Roles allowed to manage a group (metadata, members, roles).
pub const MANAGERS: &[GroupRole] = &[GroupRole::Owner, GroupRole::Admin];

/// Roles allowed to see the member list.
pub const CONTRIBUTORS: &[GroupRole] = &[GroupRole::Owner, GroupRole::Admin, GroupRole::Member];

/// Every role, guests included.
pub const ANY_ROLE: &[GroupRole] = &[
    GroupRole::Owner,
    GroupRole::Admin,
    GroupRole::Member,
    GroupRole::Guest,
];

/// Only the owner.
pub const OWNER_ONLY: &[GroupRole] = &[GroupRole::Owner];

impl GroupRole {
    fn rank(self) -> u8 {
        match self {
            GroupRole::Owner => 3,
            GroupRole::Admin => 2,
            GroupRole::Member => 1,
            GroupRole::Guest => 0,
        }
    }

    /// Compare two roles on the lattice.
    ///
    /// `Greater` means `self` sits above `other`.
    pub fn compare(self, other: GroupRole) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    /// Check this role against an explicit allow-list.
    pub fn satisfies(self, allowed: &[GroupRole]) -> bool {
        allowed.contains(&self)
    }

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Owner => "owner",
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
            GroupRole::Guest => "guest",
        }
    }
}

impl PartialOrd for GroupRole {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupRole {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(*other)
    }
}

impl FromStr for GroupRole {
    type Err = AccessError;

    /// Parse role from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(GroupRole::Owner),
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            "guest" => Ok(GroupRole::Guest),
            other => Err(AccessError::InvalidState(format!(
                "unrecognized group role '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_is_total_and_ordered() {
        assert_eq!(GroupRole::Owner.compare(GroupRole::Admin), Ordering::Greater);
        assert_eq!(GroupRole::Admin.compare(GroupRole::Member), Ordering::Greater);
        assert_eq!(GroupRole::Member.compare(GroupRole::Guest), Ordering::Greater);
        assert_eq!(GroupRole::Guest.compare(GroupRole::Owner), Ordering::Less);

        for role in ANY_ROLE {
            assert_eq!(role.compare(*role), Ordering::Equal);
        }

        let mut roles = vec![
            GroupRole::Member,
            GroupRole::Owner,
            GroupRole::Guest,
            GroupRole::Admin,
        ];
        roles.sort();
        assert_eq!(
            roles,
            vec![
                GroupRole::Guest,
                GroupRole::Member,
                GroupRole::Admin,
                GroupRole::Owner
            ]
        );
    }

    #[test]
    fn satisfies_is_allow_list_not_threshold() {
        assert!(GroupRole::Owner.satisfies(MANAGERS));
        assert!(GroupRole::Admin.satisfies(MANAGERS));
        assert!(!GroupRole::Member.satisfies(MANAGERS));

        // Owner sits above admin but is not in an admin-only list.
        assert!(!GroupRole::Owner.satisfies(&[GroupRole::Admin]));

        assert!(GroupRole::Member.satisfies(CONTRIBUTORS));
        assert!(!GroupRole::Guest.satisfies(CONTRIBUTORS));
        assert!(GroupRole::Guest.satisfies(ANY_ROLE));
        assert!(!GroupRole::Admin.satisfies(OWNER_ONLY));
    }

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!("owner".parse::<GroupRole>().unwrap(), GroupRole::Owner);
        assert_eq!("ADMIN".parse::<GroupRole>().unwrap(), GroupRole::Admin);
        assert_eq!(" Guest ".parse::<GroupRole>().unwrap(), GroupRole::Guest);
        assert!(matches!(
            "superuser".parse::<GroupRole>(),
            Err(AccessError::InvalidState(_))
        ));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&GroupRole::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: GroupRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, GroupRole::Member);
    }
}
