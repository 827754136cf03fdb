// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Group management endpoints.
//!
//! Every handler passes the caller's id to the engine, which decides from the
//! caller's membership role. Handlers never inspect roles themselves.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{
        AddMemberRequest, AssignRoleRequest, CreateGroupRequest, GroupResponse, MemberResponse,
        MembershipResponse, UpdateGroupRequest,
    },
    state::AppState,
};

/// Create a group owned by the caller.
#[utoipa::path(
    post,
    path = "/v1/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid name or picture URL", body = ErrorBody)
    )
)]
pub async fn create_group(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let view = state.engine.create_group(&user.user_id, request.into())?;
    Ok((StatusCode::CREATED, Json(view.into())))
}

/// Groups the caller is an active member of.
#[utoipa::path(
    get,
    path = "/v1/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [GroupResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_groups(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = state.engine.get_user_groups(&user.user_id)?;
    Ok(Json(groups.into_iter().map(Into::into).collect()))
}

/// Public group metadata with the caller's own role.
#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group identifier")),
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = GroupResponse),
        (status = 404, description = "Group not found", body = ErrorBody)
    )
)]
pub async fn get_group(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GroupResponse>, ApiError> {
    let view = state.engine.get_group_info(&user.user_id, &group_id)?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    patch,
    path = "/v1/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group identifier")),
    request_body = UpdateGroupRequest,
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = GroupResponse),
        (status = 403, description = "Caller is not owner or admin", body = ErrorBody),
        (status = 404, description = "Group not found", body = ErrorBody)
    )
)]
pub async fn update_group(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let view = state
        .engine
        .update_group(&user.user_id, &group_id, request.into())?;
    Ok(Json(view.into()))
}

/// Soft-delete a group. Owner only.
#[utoipa::path(
    delete,
    path = "/v1/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group identifier")),
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller is not the owner", body = ErrorBody),
        (status = 404, description = "Group not found", body = ErrorBody)
    )
)]
pub async fn delete_group(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_group(&user.user_id, &group_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Active members and their roles. Guests may not list.
#[utoipa::path(
    get,
    path = "/v1/groups/{group_id}/members",
    params(("group_id" = String, Path, description = "Group identifier")),
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [MemberResponse]),
        (status = 403, description = "Caller is a guest or not a member", body = ErrorBody)
    )
)]
pub async fn list_members(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = state.engine.list_members(&user.user_id, &group_id)?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Add a registered user as `member`, or reactivate a former member.
#[utoipa::path(
    post,
    path = "/v1/groups/{group_id}/members",
    params(("group_id" = String, Path, description = "Group identifier")),
    request_body = AddMemberRequest,
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = MembershipResponse),
        (status = 403, description = "Caller is not owner or admin", body = ErrorBody),
        (status = 404, description = "Group or user not found", body = ErrorBody)
    )
)]
pub async fn add_member(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    let membership = state
        .engine
        .add_member(&user.user_id, &group_id, request.user_id.trim())?;
    Ok((StatusCode::CREATED, Json(membership.into())))
}

#[utoipa::path(
    delete,
    path = "/v1/groups/{group_id}/members/{user_id}",
    params(
        ("group_id" = String, Path, description = "Group identifier"),
        ("user_id" = String, Path, description = "Member to remove")
    ),
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller is not owner or admin", body = ErrorBody),
        (status = 409, description = "Target is the owner", body = ErrorBody)
    )
)]
pub async fn remove_member(
    Auth(user): Auth,
    Path((group_id, member_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .remove_member(&user.user_id, &group_id, &member_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change a member's role. Assigning `owner` transfers ownership.
#[utoipa::path(
    put,
    path = "/v1/groups/{group_id}/members/{user_id}/role",
    params(
        ("group_id" = String, Path, description = "Group identifier"),
        ("user_id" = String, Path, description = "Member whose role changes")
    ),
    request_body = AssignRoleRequest,
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = MembershipResponse),
        (status = 403, description = "Caller is not owner or admin", body = ErrorBody),
        (status = 409, description = "Role change would break ownership rules", body = ErrorBody),
        (status = 422, description = "Unrecognized role", body = ErrorBody)
    )
)]
pub async fn assign_role(
    Auth(user): Auth,
    Path((group_id, member_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<AssignRoleRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let role = request.role()?;
    let membership = state
        .engine
        .assign_role(&user.user_id, &group_id, &member_id, role)?;
    Ok(Json(membership.into()))
}

/// Leave a group. The owner must transfer ownership first.
#[utoipa::path(
    post,
    path = "/v1/groups/{group_id}/leave",
    params(("group_id" = String, Path, description = "Group identifier")),
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 404, description = "Caller is not a member", body = ErrorBody),
        (status = 409, description = "Caller is the owner", body = ErrorBody)
    )
)]
pub async fn leave_group(
    Auth(user): Auth,
    Path(group_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.engine.leave_group(&user.user_id, &group_id)?;
    Ok(StatusCode::NO_CONTENT)
}
