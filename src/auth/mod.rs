// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Establishes who is calling. Authorization is the engine's job.
//!
//! ## Auth Flow
//!
//! 1. The identity provider issues an HS256-signed JWT
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. The server:
//!    - Verifies signature and expiry (60 second clock skew tolerance)
//!    - Verifies the issuer when `JWT_ISSUER` is configured
//!    - Takes `sub` as the canonical user id and `email` when present
//!
//! All endpoints except health probes and docs require authentication.

pub mod claims;
pub mod error;
pub mod extractor;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{verify_jwt, Auth};
