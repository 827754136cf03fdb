// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access control policy.
//!
//! Pure decision functions over group roles, note channels and ownership.
//! Nothing in here touches the store; the engine gathers the facts inside a
//! transaction and asks this module for a verdict.

mod error;
pub mod groups;
pub mod notes;
pub mod ownership;
pub mod roles;

pub use error::{AccessError, AccessResult};
pub use groups::{GroupAction, RoleChange};
pub use notes::{AccessChannel, NoteAction, NoteFacts, NoteGrant, NotePermission, SharePermission};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use roles::GroupRole;
