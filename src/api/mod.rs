// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    access::{AccessChannel, GroupRole, NotePermission, SharePermission},
    error::ErrorBody,
    models::{
        AddMemberRequest, AddTagRequest, AssignRoleRequest, CreateGroupRequest,
        CreateNoteRequest, GroupResponse, MemberResponse, MembershipResponse, NoteAccessResponse,
        NoteContentResponse, NoteResponse, PurgeResponse, ShareNoteRequest, ShareResponse,
        SharedNoteResponse, SyncProfileRequest, TagResponse, UpdateGroupRequest,
        UpdateNoteRequest, UpdateShareRequest, UserResponse,
    },
    state::AppState,
    storage::{AuditEvent, AuditEventType},
};

pub mod groups;
pub mod health;
pub mod notes;
pub mod tags;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        // Groups
        .route(
            "/groups",
            get(groups::list_my_groups).post(groups::create_group),
        )
        .route(
            "/groups/{group_id}",
            get(groups::get_group)
                .patch(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/groups/{group_id}/members",
            get(groups::list_members).post(groups::add_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            delete(groups::remove_member),
        )
        .route(
            "/groups/{group_id}/members/{user_id}/role",
            put(groups::assign_role),
        )
        .route("/groups/{group_id}/leave", post(groups::leave_group))
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route("/notes/shared", get(notes::list_shared_notes))
        .route(
            "/notes/{note_id}",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/{note_id}/access", get(notes::check_access))
        .route(
            "/notes/{note_id}/shares",
            get(notes::list_shares).post(notes::share_note),
        )
        .route(
            "/notes/{note_id}/shares/{user_id}",
            put(notes::update_share).delete(notes::revoke_share),
        )
        // Tags
        .route(
            "/notes/{note_id}/tags",
            get(tags::list_note_tags).post(tags::add_tag),
        )
        .route("/notes/{note_id}/tags/{name}", delete(tags::remove_tag))
        .route("/tags", get(tags::list_my_tags))
        .route("/tags/{tag_id}", delete(tags::delete_tag))
        // Users
        .route(
            "/users/me",
            get(users::get_current_user)
                .put(users::sync_profile)
                .delete(users::purge_current_user),
        )
        .route("/users/me/audit", get(users::list_audit_events));

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Registers the bearer scheme referenced by `security(("bearer_auth" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::liveness,
        health::readiness,
        groups::create_group,
        groups::list_my_groups,
        groups::get_group,
        groups::update_group,
        groups::delete_group,
        groups::list_members,
        groups::add_member,
        groups::remove_member,
        groups::assign_role,
        groups::leave_group,
        notes::create_note,
        notes::list_notes,
        notes::list_shared_notes,
        notes::get_note,
        notes::update_note,
        notes::delete_note,
        notes::check_access,
        notes::list_shares,
        notes::share_note,
        notes::update_share,
        notes::revoke_share,
        tags::list_note_tags,
        tags::add_tag,
        tags::remove_tag,
        tags::list_my_tags,
        tags::delete_tag,
        users::get_current_user,
        users::sync_profile,
        users::purge_current_user,
        users::list_audit_events
    ),
    components(
        schemas(
            ErrorBody,
            GroupRole,
            NotePermission,
            SharePermission,
            AccessChannel,
            AuditEvent,
            AuditEventType,
            CreateGroupRequest,
            UpdateGroupRequest,
            GroupResponse,
            AddMemberRequest,
            AssignRoleRequest,
            MembershipResponse,
            MemberResponse,
            CreateNoteRequest,
            UpdateNoteRequest,
            NoteResponse,
            NoteAccessResponse,
            NoteContentResponse,
            ShareNoteRequest,
            UpdateShareRequest,
            ShareResponse,
            SharedNoteResponse,
            AddTagRequest,
            TagResponse,
            SyncProfileRequest,
            UserResponse,
            PurgeResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Groups", description = "Groups, members and roles"),
        (name = "Notes", description = "Map notes and effective access"),
        (name = "Sharing", description = "Direct note grants"),
        (name = "Tags", description = "Per-user tag catalogue"),
        (name = "Users", description = "Caller profile and audit trail")
    )
)]
pub struct ApiDoc;
