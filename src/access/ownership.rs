// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Creator-scoped ownership checks.
//!
//! Notes and tags carry a single owning user. Anything that only its owner
//! may touch (deleting a tag, the ownership channel of a note) goes through
//! [`OwnershipEnforcer`].

use super::{AccessError, AccessResult};

/// A resource with at most one owning user.
pub trait OwnedResource {
    /// Owner's user id, `None` once the owner has been purged.
    fn owner_user_id(&self) -> Option<&str>;

    /// Short resource name used in denial messages.
    fn resource_kind(&self) -> &'static str;
}

/// Ownership verification for any [`OwnedResource`].
pub trait OwnershipEnforcer {
    /// Whether `user_id` owns this resource.
    fn is_owned_by(&self, user_id: &str) -> bool;

    /// Verify that `user_id` owns this resource.
    ///
    /// # Errors
    /// Returns `AccessError::PermissionDenied` for anyone else.
    fn verify_ownership(&self, user_id: &str) -> AccessResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id() == Some(user_id)
    }

    fn verify_ownership(&self, user_id: &str) -> AccessResult<()> {
        if self.is_owned_by(user_id) {
            Ok(())
        } else {
            Err(AccessError::PermissionDenied(format!(
                "only the creator may modify this {}",
                self.resource_kind()
            )))
        }
    }
}

/// Ownership check chained onto a lookup.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owner(self, user_id: &str) -> AccessResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for AccessResult<T> {
    fn verify_owner(self, user_id: &str) -> AccessResult<T> {
        let resource = self?;
        resource.verify_ownership(user_id)?;
        Ok(resource)
    }
}
