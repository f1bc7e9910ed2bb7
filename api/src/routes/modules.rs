//! `/api/modules`: module creation, ordered deletion and the two progress views.
//!
//! - `POST   /api/modules` → `create_module`
//! - `DELETE /api/modules/{module_id}` → `delete_module`
//! - `GET    /api/modules/{module_id}/progress/{student_id}` → `get_student_progress`
//! - `GET    /api/modules/{module_id}/class-progress?section_id=` → `get_class_progress`

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use services::content::NewModule;
use services::fetchers::StudentScope;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::{DraftRequest, content_error, sync_state, validation_failed};
use crate::state::AppState;

pub fn module_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_module))
        .route("/{module_id}", delete(delete_module))
        .route("/{module_id}/progress/{student_id}", get(get_student_progress))
        .route("/{module_id}/class-progress", get(get_class_progress))
}

#[derive(Debug, Deserialize)]
pub struct ClassProgressQuery {
    pub section_id: Option<i64>,
}

/// POST /api/modules
///
/// ### Request Body
/// ```json
/// { "local_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427", "subject_id": 1, "name": "Fractions", "description": "Parts of a whole", "sort_order": 1 }
/// ```
///
/// ### Responses
/// - `201 Created` → `{ "state": "synced", "item": { ...module } }`
/// - `400 Bad Request` (blank or over-long name)
/// - `500 Internal Server Error` → `{ "state": "write_failed", "draft": {...}, "reason": "..." }`
pub async fn create_module(
    State(app_state): State<AppState>,
    Json(req): Json<DraftRequest<NewModule>>,
) -> Response {
    if let Err(errors) = req.input.validate() {
        return validation_failed(&errors);
    }

    match app_state.content().create_module(req.into_draft()).await {
        Ok(state) => sync_state(state, "Module"),
        Err(err) => content_error(err),
    }
}

/// DELETE /api/modules/{module_id}
///
/// Removes attempts, completions, lesson quiz references, quizzes, lessons and
/// finally the module, in one transaction. Returns the per-step row counts.
pub async fn delete_module(
    State(app_state): State<AppState>,
    Path(module_id): Path<i64>,
) -> Response {
    match app_state.content().delete_module(module_id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report, "Module deleted successfully")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// GET /api/modules/{module_id}/progress/{student_id}
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": 3, "title": "Fractions", "completion": 67,
///     "lessons_completed": 1, "total_lessons": 2, "completed_lesson_ids": [5],
///     "quizzes_completed": 1, "total_quizzes": 1,
///     "quizzes": { "best_score": 85, "attempts": 2, "quiz_count": 1, "completed_count": 1, "details": [...] },
///     "degraded": false
///   },
///   "message": "Progress retrieved successfully"
/// }
/// ```
/// - `200 OK` with `"data": null` when the module itself could not be read
/// - `404 Not Found` when the module does not exist
pub async fn get_student_progress(
    State(app_state): State<AppState>,
    Path((module_id, student_id)): Path<(i64, i64)>,
) -> Response {
    match app_state
        .progress()
        .student_module_progress(student_id, module_id)
        .await
    {
        Ok(Some(progress)) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(progress), "Progress retrieved successfully")),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("Module not found")),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(module_id, student_id, error = %err, "module lookup failed");
            (
                StatusCode::OK,
                Json(ApiResponse::<Option<()>>::success(
                    None,
                    "Progress is temporarily unavailable",
                )),
            )
                .into_response()
        }
    }
}

/// GET /api/modules/{module_id}/class-progress?section_id=2
///
/// Without `section_id` every student is in scope.
///
/// ### Responses
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "moduleId": 3, "title": "Fractions", "totalStudents": 4, "completion": 38,
///     "lessons": [ { "id": 5, "title": "Halves", "completedBy": 3, "totalStudents": 4, "completionRate": 75 } ],
///     "quizzes": [ { "id": 9, "title": "Check", "averageScore": 73, "passedCount": 2, "attemptedCount": 3, "totalStudents": 4, "passRate": 67 } ],
///     "students": [ { "student_id": 11, "name": "Ada", "progress": { ... } } ],
///     "degraded": false
///   },
///   "message": "Class progress retrieved successfully"
/// }
/// ```
/// - `404 Not Found` when the module does not exist
pub async fn get_class_progress(
    State(app_state): State<AppState>,
    Path(module_id): Path<i64>,
    Query(query): Query<ClassProgressQuery>,
) -> Response {
    let scope = match query.section_id {
        Some(section_id) => StudentScope::Section(section_id),
        None => StudentScope::AllStudents,
    };

    match app_state.progress().class_module_progress(module_id, scope).await {
        Ok(Some(class)) => (
            StatusCode::OK,
            Json(ApiResponse::success(Some(class), "Class progress retrieved successfully")),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error("Module not found")),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(module_id, error = %err, "module lookup failed");
            (
                StatusCode::OK,
                Json(ApiResponse::<Option<()>>::success(
                    None,
                    "Class progress is temporarily unavailable",
                )),
            )
                .into_response()
        }
    }
}
