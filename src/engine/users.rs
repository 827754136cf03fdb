// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile, purge and audit trail.

use chrono::{NaiveDate, Utc};

use crate::access::{AccessError, AccessResult, GroupRole};
use crate::storage::{
    repository::normalize_email, AuditEvent, AuditEventType, AuditRepository, GroupRepository,
    MembershipRepository, NoteRepository, ShareRepository, StoredUser, UserRepository,
};

use super::{require_id, require_text, AccessEngine};

/// Profile fields the actor may set on themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Empty string clears the email
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// What [`AccessEngine::purge_user`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Notes left without an owner
    pub notes_orphaned: usize,
    /// Memberships deactivated
    pub memberships_closed: usize,
    /// Grants held by the user that were removed
    pub shares_removed: usize,
}

fn validate_email(raw: &str) -> AccessResult<Option<String>> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Ok(None);
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(|c| c.is_whitespace() || c.is_control())
        }
        None => false,
    };
    if !valid {
        return Err(AccessError::InvalidState(format!("invalid email '{raw}'")));
    }
    Ok(Some(email))
}

impl AccessEngine {
    /// Register the actor or update their profile.
    ///
    /// Emails are unique after normalization; a taken email is a `Conflict`.
    pub fn sync_profile(&self, actor: &str, update: ProfileUpdate) -> AccessResult<StoredUser> {
        let result = self.store.write(|txn| {
            require_id("user id", actor)?;
            let users = UserRepository::new(txn);
            let mut user = users.get(actor)?.unwrap_or_else(|| StoredUser::new(actor));

            if let Some(email) = &update.email {
                user.email = validate_email(email)?;
            }
            if let Some(name) = &update.display_name {
                user.display_name = if name.trim().is_empty() {
                    None
                } else {
                    Some(require_text("display name", name)?)
                };
            }
            user.updated_at = Utc::now();

            users.save(&user)?;
            Ok(user)
        });
        self.record(AuditEventType::ProfileSynced, actor, "user", actor, &result);
        result
    }

    /// The actor's profile, `NotFound` until first registered.
    pub fn get_profile(&self, actor: &str) -> AccessResult<StoredUser> {
        self.store.read(|txn| {
            UserRepository::new(txn)
                .get(actor)?
                .ok_or_else(|| AccessError::not_found("user", actor))
        })
    }

    /// Remove the actor from the system.
    ///
    /// Refused while the actor owns a live group. Otherwise owned notes are
    /// kept with no owner, memberships are deactivated, grants held by the
    /// actor are dropped and the user record is removed.
    pub fn purge_user(&self, actor: &str) -> AccessResult<PurgeSummary> {
        let result = self.store.write(|txn| {
            let users = UserRepository::new(txn);
            if users.get(actor)?.is_none() {
                return Err(AccessError::not_found("user", actor));
            }

            let groups = GroupRepository::new(txn);
            let memberships = MembershipRepository::new(txn);
            let active = memberships.list_for_user(actor)?;
            for membership in &active {
                if membership.role == GroupRole::Owner
                    && groups.get_live(&membership.group_id)?.is_some()
                {
                    return Err(AccessError::OwnershipConflict(format!(
                        "user owns group {}; transfer ownership or delete it first",
                        membership.group_id
                    )));
                }
            }

            let mut summary = PurgeSummary::default();

            for mut membership in active {
                membership.active = false;
                memberships.save(&membership)?;
                summary.memberships_closed += 1;
            }

            let notes = NoteRepository::new(txn);
            for mut note in notes.list_by_owner(actor)? {
                note.owner_id = None;
                note.updated_at = Utc::now();
                notes.save(&note)?;
                summary.notes_orphaned += 1;
            }

            let shares = ShareRepository::new(txn);
            for share in shares.list_for_user(actor)? {
                if shares.remove(&share.note_id, actor)? {
                    summary.shares_removed += 1;
                }
            }

            users.delete(actor)?;
            Ok(summary)
        });
        self.record(AuditEventType::UserPurged, actor, "user", actor, &result);
        result
    }

    /// The actor's own audit events for one day.
    pub fn audit_events_for_user(
        &self,
        actor: &str,
        date: NaiveDate,
    ) -> AccessResult<Vec<AuditEvent>> {
        let day = date.format("%Y-%m-%d").to_string();
        Ok(AuditRepository::new(&self.store).search_by_user(actor, &day)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::SharePermission;
    use crate::engine::tests::engine;
    use crate::engine::{NewGroup, NewNote};

    fn profile(email: &str) -> ProfileUpdate {
        ProfileUpdate {
            email: Some(email.into()),
            display_name: None,
        }
    }

    #[test]
    fn sync_registers_and_normalizes() {
        let (engine, _dir) = engine();
        let user = engine.sync_profile("u1", profile(" Alice@Example.com ")).unwrap();
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(engine.get_profile("u1").unwrap(), user);
    }

    #[test]
    fn email_collision_is_a_store_conflict() {
        let (engine, _dir) = engine();
        engine.sync_profile("u1", profile("a@example.com")).unwrap();
        let err = engine
            .sync_profile("u2", profile("A@EXAMPLE.COM"))
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));
        assert!(!err.is_denial());
    }

    #[test]
    fn malformed_email_is_invalid() {
        let (engine, _dir) = engine();
        for bad in ["no-at-sign", "@example.com", "a@", "a@b@c", "a b@example.com"] {
            assert!(matches!(
                engine.sync_profile("u1", profile(bad)),
                Err(AccessError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let (engine, _dir) = engine();
        assert!(matches!(
            engine.get_profile("nobody"),
            Err(AccessError::NotFound { .. })
        ));
    }

    #[test]
    fn purge_is_refused_for_group_owners() {
        let (engine, _dir) = engine();
        engine
            .create_group(
                "u1",
                NewGroup {
                    name: "Hikers".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(matches!(
            engine.purge_user("u1"),
            Err(AccessError::OwnershipConflict(_))
        ));
        assert!(engine.get_profile("u1").is_ok());
    }

    #[test]
    fn purge_tombstones_notes_and_clears_access() {
        let (engine, _dir) = engine();
        engine.sync_profile("u1", profile("one@example.com")).unwrap();
        engine.sync_profile("u2", profile("two@example.com")).unwrap();

        let g = engine
            .create_group(
                "u2",
                NewGroup {
                    name: "Hikers".into(),
                    ..Default::default()
                },
            )
            .unwrap()
            .group
            .id;
        engine.add_member("u2", &g, "u1").unwrap();

        let own = engine
            .create_note(
                "u1",
                NewNote {
                    title: "Mine".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let theirs = engine
            .create_note(
                "u2",
                NewNote {
                    title: "Theirs".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        engine
            .share_note("u2", &theirs.id, "u1", SharePermission::Read)
            .unwrap();

        let summary = engine.purge_user("u1").unwrap();
        assert_eq!(
            summary,
            PurgeSummary {
                notes_orphaned: 1,
                memberships_closed: 1,
                shares_removed: 1,
            }
        );

        assert!(engine.get_user_groups("u1").unwrap().is_empty());
        assert!(engine.list_shared_notes("u1").unwrap().is_empty());
        assert!(engine.get_note_content("u1", &own.id).is_err());
        assert!(matches!(
            engine.get_profile("u1"),
            Err(AccessError::NotFound { .. })
        ));

        // the email is free again
        assert!(engine.sync_profile("u3", profile("one@example.com")).is_ok());
    }

    #[test]
    fn audit_trail_is_scoped_to_actor() {
        let (engine, _dir) = engine();
        engine.sync_profile("u1", profile("one@example.com")).unwrap();
        engine.sync_profile("u2", profile("two@example.com")).unwrap();

        let today = Utc::now().date_naive();
        let events = engine.audit_events_for_user("u1", today).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AuditEventType::ProfileSynced);
        assert_eq!(events[0].user_id.as_deref(), Some("u1"));
    }
}
