//! `/api/lessons`
//!
//! - `POST   /api/lessons` → `create_lesson`
//! - `DELETE /api/lessons/{lesson_id}` → `delete_lesson`
//! - `POST   /api/lessons/{lesson_id}/complete` → `complete_lesson`
//! - `PUT    /api/lessons/{lesson_id}/quiz` → `bind_quiz`

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post, put},
};
use serde::Deserialize;
use services::content::NewLesson;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::{DraftRequest, content_error, sync_state, validation_failed};
use crate::state::AppState;

pub fn lesson_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lesson))
        .route("/{lesson_id}", delete(delete_lesson))
        .route("/{lesson_id}/complete", post(complete_lesson))
        .route("/{lesson_id}/quiz", put(bind_quiz))
}

#[derive(Debug, Deserialize)]
pub struct CompleteLessonRequest {
    pub student_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BindQuizRequest {
    pub quiz_id: Option<i64>,
}

/// POST /api/lessons
///
/// ### Request Body
/// ```json
/// { "module_id": 3, "title": "Halves", "description": "...", "sort_order": 1, "quiz_id": null }
/// ```
///
/// ### Responses
/// - `201 Created` (synced), `400 Bad Request`, `404 Not Found` (unknown quiz),
///   `500 Internal Server Error` (write failed, draft returned)
pub async fn create_lesson(
    State(app_state): State<AppState>,
    Json(req): Json<DraftRequest<NewLesson>>,
) -> Response {
    if let Err(errors) = req.input.validate() {
        return validation_failed(&errors);
    }

    match app_state.content().create_lesson(req.into_draft()).await {
        Ok(state) => sync_state(state, "Lesson"),
        Err(err) => content_error(err),
    }
}

/// DELETE /api/lessons/{lesson_id}
pub async fn delete_lesson(
    State(app_state): State<AppState>,
    Path(lesson_id): Path<i64>,
) -> Response {
    match app_state.content().delete_lesson(lesson_id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report, "Lesson deleted successfully")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// POST /api/lessons/{lesson_id}/complete
///
/// Records that a student finished the lesson. Repeating it is harmless.
///
/// ### Request Body
/// ```json
/// { "student_id": 11 }
/// ```
pub async fn complete_lesson(
    State(app_state): State<AppState>,
    Path(lesson_id): Path<i64>,
    Json(req): Json<CompleteLessonRequest>,
) -> Response {
    match app_state
        .content()
        .record_lesson_completion(req.student_id, lesson_id)
        .await
    {
        Ok(completion) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(completion, "Lesson marked as completed")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// PUT /api/lessons/{lesson_id}/quiz
///
/// Binds a quiz of the same module to the lesson, or clears it with `null`.
pub async fn bind_quiz(
    State(app_state): State<AppState>,
    Path(lesson_id): Path<i64>,
    Json(req): Json<BindQuizRequest>,
) -> Response {
    match app_state.content().bind_lesson_quiz(lesson_id, req.quiz_id).await {
        Ok(lesson) => (
            StatusCode::OK,
            Json(ApiResponse::success(lesson, "Lesson updated successfully")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}
