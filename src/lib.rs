// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Map Notes - Notes and Groups Service
//!
//! Multi-tenant backend where users keep map notes, organise them in groups
//! and share them with each other. Every read and write is decided by a
//! single access control engine before it touches the store.
//!
//! ## Modules
//!
//! - `access` - Pure policy: roles, group rules, note permission resolution
//! - `engine` - Access control engine composing policy with storage
//! - `storage` - Embedded redb database, repositories and audit trail
//! - `geotags` - Marker position and colour derived from note tags
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Identity from bearer JWTs

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod geotags;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
