// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    models::{AddTagRequest, TagResponse},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/notes/{note_id}/tags",
    params(("note_id" = String, Path, description = "Note identifier")),
    tag = "Tags",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = [TagResponse]),
        (status = 403, description = "No access to the note", body = ErrorBody)
    )
)]
pub async fn list_note_tags(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.engine.get_note_tags(&user.user_id, &note_id)?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

/// Attach one of the caller's tags by name, creating it if needed.
#[utoipa::path(
    post,
    path = "/v1/notes/{note_id}/tags",
    params(("note_id" = String, Path, description = "Note identifier")),
    request_body = AddTagRequest,
    tag = "Tags",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, body = TagResponse),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 422, description = "Invalid name or colour", body = ErrorBody)
    )
)]
pub async fn add_tag(
    Auth(user): Auth,
    Path(note_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AddTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    let tag = state
        .engine
        .add_tag(&user.user_id, &note_id, request.into())?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

#[utoipa::path(
    delete,
    path = "/v1/notes/{note_id}/tags/{name}",
    params(
        ("note_id" = String, Path, description = "Note identifier"),
        ("name" = String, Path, description = "Name of one of the caller's tags")
    ),
    tag = "Tags",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "No full control", body = ErrorBody),
        (status = 404, description = "Caller has no tag with that name", body = ErrorBody)
    )
)]
pub async fn remove_tag(
    Auth(user): Auth,
    Path((note_id, name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.engine.remove_tag(&user.user_id, &note_id, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/tags",
    tag = "Tags",
    security(("bearer_auth" = [])),
    responses((status = 200, body = [TagResponse]))
)]
pub async fn list_my_tags(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.engine.list_tags(&user.user_id)?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/v1/tags/{tag_id}",
    params(("tag_id" = String, Path, description = "Tag identifier")),
    tag = "Tags",
    security(("bearer_auth" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Caller did not create the tag", body = ErrorBody),
        (status = 404, description = "Tag not found", body = ErrorBody)
    )
)]
pub async fn delete_tag(
    Auth(user): Auth,
    Path(tag_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_tag(&user.user_id, &tag_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::api::tests::TestApp;

    #[tokio::test]
    async fn tag_roundtrip_through_catalogue() {
        let app = TestApp::new();
        let (_, note) = app
            .send(Method::POST, "/v1/notes", Some("u1"), Some(json!({"title": "Lake"})))
            .await;
        let id = note["id"].as_str().unwrap().to_string();

        let (status, tag) = app
            .send(
                Method::POST,
                &format!("/v1/notes/{id}/tags"),
                Some("u1"),
                Some(json!({"name": "swim", "color": "#00aaff"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tag["color"], "#00aaff");
        let tag_id = tag["id"].as_str().unwrap().to_string();

        let (_, mine) = app.send(Method::GET, "/v1/tags", Some("u1"), None).await;
        assert_eq!(mine.as_array().unwrap().len(), 1);

        // other users see nothing and cannot delete it
        let (status, _) = app
            .send(Method::DELETE, &format!("/v1/tags/{tag_id}"), Some("u2"), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(
                Method::DELETE,
                &format!("/v1/notes/{id}/tags/swim"),
                Some("u1"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, tags) = app
            .send(Method::GET, &format!("/v1/notes/{id}/tags"), Some("u1"), None)
            .await;
        assert!(tags.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_colour_is_unprocessable() {
        let app = TestApp::new();
        let (_, note) = app
            .send(Method::POST, "/v1/notes", Some("u1"), Some(json!({"title": "Lake"})))
            .await;
        let id = note["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .send(
                Method::POST,
                &format!("/v1/notes/{id}/tags"),
                Some("u1"),
                Some(json!({"name": "swim", "color": "blue"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error_code"], "invalid_state");
    }
}
