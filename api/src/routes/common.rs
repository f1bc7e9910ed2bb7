//! Status-code mapping shared by the route groups.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use services::content::{ContentError, Draft, SyncState};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::response::ApiResponse;

/// Creation body: the input fields plus an optional client-generated `local_id`.
#[derive(Debug, Deserialize)]
pub struct DraftRequest<D> {
    #[serde(default)]
    pub local_id: Option<Uuid>,
    #[serde(flatten)]
    pub input: D,
}

impl<D> DraftRequest<D> {
    pub fn into_draft(self) -> Draft<D> {
        match self.local_id {
            Some(local_id) => Draft::with_local_id(local_id, self.input),
            None => Draft::new(self.input),
        }
    }
}

pub fn validation_failed(errors: &ValidationErrors) -> Response {
    let message = util::validation::format_validation_errors(errors);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::error(message))).into_response()
}

pub fn content_error(err: ContentError) -> Response {
    let status = match &err {
        ContentError::Validation(_) => StatusCode::BAD_REQUEST,
        ContentError::NotFound { .. } => StatusCode::NOT_FOUND,
        ContentError::AttemptLimit { .. } => StatusCode::CONFLICT,
        ContentError::Database(e) => {
            tracing::error!(error = %e, "content request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

/// `201` with the stored row, or `500` with the draft that could not be saved.
pub fn sync_state<T, D>(state: SyncState<T, D>, what: &str) -> Response
where
    T: Serialize,
    D: Serialize,
{
    match state {
        SyncState::Synced { .. } => (
            StatusCode::CREATED,
            Json(ApiResponse::success(state, format!("{what} created successfully"))),
        )
            .into_response(),
        SyncState::PendingWrite { .. } => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(state, format!("{what} queued"))),
        )
            .into_response(),
        SyncState::WriteFailed { ref reason, .. } => {
            let message = format!("Failed to save {}: {reason}", what.to_lowercase());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure(state, message)),
            )
                .into_response()
        }
    }
}
