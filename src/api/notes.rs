// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Note and sharing endpoints.
//!
//! Access to a note comes from ownership, an owner/admin role in the note's
//! group, or a direct share. The engine resolves which applies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{
        CreateNoteRequest, NoteAccessResponse, NoteContentResponse, NoteResponse,
        ShareNoteRequest, ShareResponse, SharedNoteResponse, UpdateNoteRequest,
        UpdateShareRequest,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/notes",
    tag = "Notes",
    security(("bearer_auth" = [])),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteResponse),
        (status = 403, description = "Caller cannot place notes in the group", body = ErrorBody),
        (status = 422, description = "Invalid title", body = ErrorBody)
    )
)]
pub async fn create_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let note = state.engine.create_note(&user.user_id, request.into())?;
    Ok((StatusCode::CREATED, Json(note.into())))
}

/// Notes the caller owns plus notes of groups the caller belongs to.
#[utoipa::path(
    get,
    path = "/v1/notes",
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [NoteResponse]))
)]
pub async fn list_notes(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = state.engine.get_user_notes(&user.user_id)?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}

/// Notes shared directly with the caller.
#[utoipa::path(
    get,
    path = "/v1/notes/shared",
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [SharedNoteResponse]))
)]
pub async fn list_shared_notes(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<SharedNoteResponse>>, ApiError> {
    let notes = state.engine.list_shared_notes(&user.user_id)?;
    Ok(Json(notes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note identifier")),
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = NoteContentResponse),
        (status = 403, description = "No access to the note", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody)
    )
)]
pub async fn get_note(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NoteContentResponse>, ApiError> {
    let content = state.engine.get_note_content(&user.user_id, &note_id)?;
    Ok(Json(content.into()))
}

/// Partial update. Moving the note between groups takes full control.
#[utoipa::path(
    patch,
    path = "/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note identifier")),
    request_body = UpdateNoteRequest,
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = NoteResponse),
        (status = 403, description = "No write access", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody)
    )
)]
pub async fn update_note(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let note = state
        .engine
        .update_note(&user.user_id, &note_id, request.into())?;
    Ok(Json(note.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note identifier")),
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 404, description = "Note not found", body = ErrorBody)
    )
)]
pub async fn delete_note(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_note(&user.user_id, &note_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's effective permission and where it comes from.
#[utoipa::path(
    get,
    path = "/v1/notes/{note_id}/access",
    params(("note_id" = String, Path, description = "Note identifier")),
    tag = "Notes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = NoteAccessResponse),
        (status = 403, description = "No access to the note", body = ErrorBody)
    )
)]
pub async fn check_access(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NoteAccessResponse>, ApiError> {
    let grant = state.engine.check_note_access(&user.user_id, &note_id)?;
    Ok(Json(NoteAccessResponse::new(note_id, grant)))
}

#[utoipa::path(
    get,
    path = "/v1/notes/{note_id}/shares",
    params(("note_id" = String, Path, description = "Note identifier")),
    tag = "Sharing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [ShareResponse]),
        (status = 403, description = "No full control", body = ErrorBody)
    )
)]
pub async fn list_shares(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ShareResponse>>, ApiError> {
    let shares = state.engine.list_note_shares(&user.user_id, &note_id)?;
    Ok(Json(shares.into_iter().map(Into::into).collect()))
}

/// Grant a user read or write access. Replaces an existing grant.
#[utoipa::path(
    post,
    path = "/v1/notes/{note_id}/shares",
    params(("note_id" = String, Path, description = "Note identifier")),
    request_body = ShareNoteRequest,
    tag = "Sharing",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = ShareResponse),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 404, description = "Note or user not found", body = ErrorBody),
        (status = 422, description = "Unrecognized permission", body = ErrorBody)
    )
)]
pub async fn share_note(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<ShareNoteRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), ApiError> {
    let permission = request.permission()?;
    let share = state.engine.share_note(
        &user.user_id,
        &note_id,
        request.user_id.trim(),
        permission,
    )?;
    Ok((StatusCode::CREATED, Json(share.into())))
}

#[utoipa::path(
    put,
    path = "/v1/notes/{note_id}/shares/{user_id}",
    params(
        ("note_id" = String, Path, description = "Note identifier"),
        ("user_id" = String, Path, description = "User holding the grant")
    ),
    request_body = UpdateShareRequest,
    tag = "Sharing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = ShareResponse),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 404, description = "No such grant", body = ErrorBody),
        (status = 422, description = "Unrecognized permission", body = ErrorBody)
    )
)]
pub async fn update_share(
    Auth(user): Auth,
    Path((note_id, target)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateShareRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    let permission = request.permission()?;
    let share = state.engine.update_note_permissions(
        &user.user_id,
        &note_id,
        &target,
        permission,
    )?;
    Ok(Json(share.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/notes/{note_id}/shares/{user_id}",
    params(
        ("note_id" = String, Path, description = "Note identifier"),
        ("user_id" = String, Path, description = "User holding the grant")
    ),
    tag = "Sharing",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 404, description = "No such grant", body = ErrorBody)
    )
)]
pub async fn revoke_share(
    Auth(user): Auth,
    Path((note_id, target)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .revoke_note_access(&user.user_id, &note_id, &target)?;
    Ok(StatusCode::NO_CONTENT)
}
