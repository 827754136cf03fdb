// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims read from an identity token.
///
/// `exp` is validated by `jsonwebtoken`; `iss` only when an issuer is
/// configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the canonical user id
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Email asserted by the identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The caller of a request, as established by the token.
///
/// `user_id` is the actor for every engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email.filter(|e| !e.trim().is_empty()),
            expires_at: claims.exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "auth0|123".to_string(),
            exp: 1700003600,
            iat: Some(1700000000),
            iss: Some("https://id.example.com/".to_string()),
            email: Some("hiker@example.com".to_string()),
        }
    }

    #[test]
    fn from_claims_extracts_user_id_and_email() {
        let user = AuthenticatedUser::from_claims(sample_claims());
        assert_eq!(user.user_id, "auth0|123");
        assert_eq!(user.email.as_deref(), Some("hiker@example.com"));
        assert_eq!(user.expires_at, 1700003600);
    }

    #[test]
    fn blank_email_claim_is_dropped() {
        let mut claims = sample_claims();
        claims.email = Some("  ".to_string());
        assert_eq!(AuthenticatedUser::from_claims(claims).email, None);
    }

    #[test]
    fn optional_claims_may_be_absent() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"sub":"u1","exp":1700003600}"#).unwrap();
        assert!(claims.iss.is_none());
        assert!(claims.email.is_none());
    }
}
