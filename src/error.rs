// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::access::AccessError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
}

/// JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid_state", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let status = match &err {
            AccessError::NotFound { .. } => StatusCode::NOT_FOUND,
            AccessError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AccessError::OwnershipConflict(_) | AccessError::Conflict(_) => StatusCode::CONFLICT,
            AccessError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AccessError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        // Store internals stay in the logs.
        let message = match &err {
            AccessError::Unavailable(_) => "Storage is temporarily unavailable".to_string(),
            other => other.to_string(),
        };
        Self::new(status, err.error_code(), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.to_string(),
        });
        (self.status, body).into_response()
    }
}
