// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives in a single embedded redb database under the
//! configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   mapnotes.redb     # users, groups, memberships, notes, shares, tags, audit
//! ```
//!
//! The engine never reaches past this module: it opens a transaction through
//! [`Store`] and works through the repositories.

pub mod audit;
pub mod database;
pub mod paths;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use database::{Store, StorageError, StorageResult, TxRead, TxWrite};
pub use paths::StoragePaths;
pub use repository::{
    GroupRepository, MembershipRepository, NoteRepository, ShareRepository, StoredGroup,
    StoredMembership, StoredNote, StoredShare, StoredTag, StoredUser, TagRepository,
    UserRepository,
};
