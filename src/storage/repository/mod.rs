// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository borrows a transaction. Reads work on either transaction
//! kind; writes need a write transaction, so a check and the mutation it
//! guards can share one atomic unit.

pub mod groups;
pub mod memberships;
pub mod notes;
pub mod shares;
pub mod tags;
pub mod users;

pub use groups::{GroupRepository, StoredGroup};
pub use memberships::{MembershipRepository, StoredMembership};
pub use notes::{NoteRepository, StoredNote};
pub use shares::{ShareRepository, StoredShare};
pub use tags::{StoredTag, TagRepository};
pub use users::{normalize_email, StoredUser, UserRepository};
