//! `/api/subjects/{subject}/...`: fallback-aware module listings.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use services::fallback::ModuleSource;

use crate::response::ApiResponse;
use crate::state::AppState;

pub fn subject_routes() -> Router<AppState> {
    Router::new()
        .route("/{subject}/modules", get(get_subject_modules))
        .route("/{subject}/progress", get(get_subject_progress))
}

#[derive(Debug, Deserialize)]
pub struct StudentQuery {
    pub student_id: i64,
}

/// GET /api/subjects/{subject}/modules
///
/// Modules of a subject with their lessons and quizzes. If the store cannot be
/// read, the static sample set for the subject is returned with
/// `"source": "sample"`.
///
/// ### Response
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "subject": "Mathematics",
///     "source": "live",
///     "modules": [ { "id": 3, "name": "Fractions", "lessons": [...], "quizzes": [...] } ],
///     "degraded": false
///   },
///   "message": "Modules retrieved successfully"
/// }
/// ```
pub async fn get_subject_modules(
    State(app_state): State<AppState>,
    Path(subject): Path<String>,
) -> impl IntoResponse {
    let listing = app_state.progress().subject_modules(&subject).await;
    let message = match listing.source {
        ModuleSource::Live => "Modules retrieved successfully",
        ModuleSource::Sample => "Showing sample modules; live data is unavailable",
    };
    (StatusCode::OK, Json(ApiResponse::success(listing, message)))
}

/// GET /api/subjects/{subject}/progress?student_id=7
///
/// Per-module progress for one student across a subject.
///
/// ### Responses
/// - `200 OK` with `{ subject, student_id, source, modules: [ModuleProgress], degraded }`
/// - `400 Bad Request` when `student_id` is missing
pub async fn get_subject_progress(
    State(app_state): State<AppState>,
    Path(subject): Path<String>,
    Query(query): Query<StudentQuery>,
) -> Response {
    let progress = app_state
        .progress()
        .student_subject_progress(query.student_id, &subject)
        .await;

    (
        StatusCode::OK,
        Json(ApiResponse::success(progress, "Progress retrieved successfully")),
    )
        .into_response()
}
