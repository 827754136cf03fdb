// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use jsonwebtoken::DecodingKey;

use crate::engine::AccessEngine;
use crate::storage::Store;

/// Token verification settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub decoding_key: DecodingKey,
    /// Required `iss` claim, when set
    pub issuer: Option<String>,
}

impl AuthConfig {
    pub fn hs256(secret: &[u8], issuer: Option<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub engine: AccessEngine,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(store: Store, auth: AuthConfig) -> Self {
        Self {
            engine: AccessEngine::new(store),
            auth: Arc::new(auth),
        }
    }

    pub fn store(&self) -> &Store {
        self.engine.store()
    }
}
