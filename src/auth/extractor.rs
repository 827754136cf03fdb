// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.user_id is the actor for engine calls
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Validation};
use tracing::debug;

use super::{claims::TokenClaims, AuthError, AuthenticatedUser};
use crate::state::{AppState, AuthConfig};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Longest accepted subject.
const MAX_SUBJECT_LEN: usize = 255;

/// Extractor for authenticated users.
///
/// Verifies the bearer token from the Authorization header and yields the
/// caller. Handlers that take `Auth` reject unauthenticated requests with 401
/// before any engine call is made.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_jwt(token, &state.auth)?;
        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// Verify an HS256 token and extract the caller.
pub fn verify_jwt(token: &str, config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_aud = false;
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = decode::<TokenClaims>(token, &config.decoding_key, &validation).map_err(|e| {
        debug!(error = %e, "Token rejected");
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::InvalidIssuer,
            _ => AuthError::MalformedToken,
        }
    })?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty()
        || claims.sub.len() > MAX_SUBJECT_LEN
        || claims.sub.chars().any(char::is_control)
    {
        return Err(AuthError::InvalidSubject);
    }

    Ok(AuthenticatedUser::from_claims(claims))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &[u8] = b"test-signature-key";

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    pub(crate) fn mint_token(sub: &str, issuer: Option<&str>, exp: i64) -> String {
        let claims = TokenClaims {
            sub: sub.to_string(),
            exp,
            iat: Some(now()),
            iss: issuer.map(str::to_string),
            email: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap()
    }

    /// Token for `sub` valid for an hour, without issuer.
    pub(crate) fn token_for(sub: &str) -> String {
        mint_token(sub, None, now() + 3600)
    }

    fn config(issuer: Option<&str>) -> AuthConfig {
        AuthConfig::hs256(TEST_SECRET, issuer.map(str::to_string))
    }

    #[test]
    fn valid_token_yields_subject() {
        let user = verify_jwt(&token_for("auth0|42"), &config(None)).unwrap();
        assert_eq!(user.user_id, "auth0|42");
    }

    #[test]
    fn wrong_secret_is_invalid_signature() {
        let other = AuthConfig::hs256(b"another-key", None);
        assert_eq!(
            verify_jwt(&token_for("u1"), &other),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn expired_beyond_leeway_is_rejected() {
        let token = mint_token("u1", None, now() - 600);
        assert_eq!(verify_jwt(&token, &config(None)), Err(AuthError::TokenExpired));

        // inside the leeway window still passes
        let token = mint_token("u1", None, now() - 10);
        assert!(verify_jwt(&token, &config(None)).is_ok());
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let cfg = config(Some("https://id.example.com/"));
        let good = mint_token("u1", Some("https://id.example.com/"), now() + 60);
        let bad = mint_token("u1", Some("https://evil.example.com/"), now() + 60);
        assert!(verify_jwt(&good, &cfg).is_ok());
        assert_eq!(verify_jwt(&bad, &cfg), Err(AuthError::InvalidIssuer));
    }

    #[test]
    fn unusable_subject_is_rejected() {
        let token = mint_token("a\u{1f}b", None, now() + 60);
        assert_eq!(verify_jwt(&token, &config(None)), Err(AuthError::InvalidSubject));
        let token = mint_token("  ", None, now() + 60);
        assert_eq!(verify_jwt(&token, &config(None)), Err(AuthError::InvalidSubject));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            verify_jwt("not-a-jwt", &config(None)),
            Err(AuthError::MalformedToken)
        );
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _dir) = crate::state::tests::test_state();
        let mut parts = parts_with(None);
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));

        let mut parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let (state, _dir) = crate::state::tests::test_state();
        let header = format!("Bearer {}", token_for("user_123"));
        let mut parts = parts_with(Some(&header));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, "user_123");
        assert!(parts.extensions.get::<AuthenticatedUser>().is_some());
    }
}
