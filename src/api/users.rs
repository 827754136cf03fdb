// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.
//!
//! All of them act on the caller only; there is no way to address another
//! user's profile.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{AuditQuery, PurgeResponse, SyncProfileRequest, UserResponse},
    state::AppState,
    storage::AuditEvent,
};

/// Get the caller's stored profile.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Caller has not been registered yet", body = ErrorBody)
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.engine.get_profile(&user.user_id)?;
    Ok(Json(profile.into()))
}

/// Register the caller or update their profile.
///
/// Without an `email` in the body the token's `email` claim is used.
#[utoipa::path(
    put,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = SyncProfileRequest,
    responses(
        (status = 200, description = "Profile stored", body = UserResponse),
        (status = 409, description = "Email belongs to another user", body = ErrorBody),
        (status = 422, description = "Malformed email", body = ErrorBody)
    )
)]
pub async fn sync_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<SyncProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let update = request.into_update(user.email.clone());
    let profile = state.engine.sync_profile(&user.user_id, update)?;
    Ok(Json(profile.into()))
}

/// Remove the caller from the system.
#[utoipa::path(
    delete,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User purged", body = PurgeResponse),
        (status = 404, description = "Caller is not registered", body = ErrorBody),
        (status = 409, description = "Caller still owns a group", body = ErrorBody)
    )
)]
pub async fn purge_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let summary = state.engine.purge_user(&user.user_id)?;
    Ok(Json(summary.into()))
}

/// The caller's own audit events for one day.
#[utoipa::path(
    get,
    path = "/v1/users/me/audit",
    params(AuditQuery),
    tag = "Users",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [AuditEvent]))
)]
pub async fn list_audit_events(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let events = state.engine.audit_events_for_user(&user.user_id, date)?;
    Ok(Json(events))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::tests::TestApp;

    #[tokio::test]
    async fn profile_is_registered_on_sync() {
        let app = TestApp::new();

        let (status, _) = app.send(Method::GET, "/v1/users/me", Some("u1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, me) = app
            .send(
                Method::PUT,
                "/v1/users/me",
                Some("u1"),
                Some(json!({"email": "Ann@Example.com", "display_name": "Ann"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "ann@example.com");
        assert_eq!(me["user_id"], "u1");

        let (status, body) = app
            .send(
                Method::PUT,
                "/v1/users/me",
                Some("u2"),
                Some(json!({"email": "ann@example.com"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_code"], "conflict");
    }

    #[tokio::test]
    async fn owner_cannot_purge_until_group_is_gone() {
        let app = TestApp::new();
        let (_, group) = app
            .send(Method::POST, "/v1/groups", Some("u1"), Some(json!({"name": "Hikers"})))
            .await;
        let gid = group["id"].as_str().unwrap().to_string();

        let (status, _) = app.send(Method::DELETE, "/v1/users/me", Some("u1"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        app.send(Method::DELETE, &format!("/v1/groups/{gid}"), Some("u1"), None)
            .await;
        let (status, summary) = app.send(Method::DELETE, "/v1/users/me", Some("u1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["memberships_closed"], 1);
    }

    #[tokio::test]
    async fn audit_trail_lists_own_events() {
        let app = TestApp::new();
        app.send(Method::POST, "/v1/groups", Some("u1"), Some(json!({"name": "Hikers"})))
            .await;

        let (status, events) = app
            .send(Method::GET, "/v1/users/me/audit", Some("u1"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(events[0]["event_type"], "group_created");

        let (_, others) = app
            .send(Method::GET, "/v1/users/me/audit", Some("u2"), None)
            .await;
        assert!(others.as_array().unwrap().is_empty());
    }
}
