//! `/api/quizzes`
//!
//! - `POST   /api/quizzes` → `create_quiz`
//! - `DELETE /api/quizzes/{quiz_id}` → `delete_quiz`
//! - `PUT    /api/quizzes/{quiz_id}/questions` → `replace_questions`
//! - `POST   /api/quizzes/{quiz_id}/attempts` → `submit_attempt`

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post, put},
};
use serde::Deserialize;
use services::content::{NewQuiz, QuestionInput};
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::{DraftRequest, content_error, sync_state, validation_failed};
use crate::state::AppState;

pub fn quiz_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quiz))
        .route("/{quiz_id}", delete(delete_quiz))
        .route("/{quiz_id}/questions", put(replace_questions))
        .route("/{quiz_id}/attempts", post(submit_attempt))
}

#[derive(Debug, Deserialize)]
pub struct ReplaceQuestionsRequest {
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub student_id: i64,
    pub correct_answers: u32,
    pub total_questions: u32,
}

/// POST /api/quizzes
///
/// ### Request Body
/// ```json
/// {
///   "module_id": 3,
///   "title": "Fractions check",
///   "passing_score": 70,
///   "lesson_id": 5,
///   "questions": [
///     { "text": "Half of 8?", "options": ["2", "4", "6", "8"], "correct_option": 1 }
///   ]
/// }
/// ```
///
/// ### Validation Rules
/// * `title`: required, at most 200 characters
/// * `passing_score`: 0 to 100
/// * `questions`: at least one; each with text, exactly 4 non-empty options and
///   `correct_option` between 0 and 3
pub async fn create_quiz(
    State(app_state): State<AppState>,
    Json(req): Json<DraftRequest<NewQuiz>>,
) -> Response {
    if let Err(errors) = req.input.validate() {
        return validation_failed(&errors);
    }

    match app_state.content().create_quiz(req.into_draft()).await {
        Ok(state) => sync_state(state, "Quiz"),
        Err(err) => content_error(err),
    }
}

/// DELETE /api/quizzes/{quiz_id}
///
/// Clears lessons that point at the quiz, deletes its attempts, then the quiz.
pub async fn delete_quiz(
    State(app_state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Response {
    match app_state.content().delete_quiz(quiz_id).await {
        Ok(report) => (
            StatusCode::OK,
            Json(ApiResponse::success(report, "Quiz deleted successfully")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// PUT /api/quizzes/{quiz_id}/questions
///
/// Replaces the full question list.
pub async fn replace_questions(
    State(app_state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<ReplaceQuestionsRequest>,
) -> Response {
    match app_state
        .content()
        .update_quiz_questions(quiz_id, req.questions)
        .await
    {
        Ok(quiz) => (
            StatusCode::OK,
            Json(ApiResponse::success(quiz, "Questions updated successfully")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}

/// POST /api/quizzes/{quiz_id}/attempts
///
/// ### Request Body
/// ```json
/// { "student_id": 11, "correct_answers": 4, "total_questions": 5 }
/// ```
///
/// ### Responses
/// - `201 Created` with the stored attempt (`score` is 80 here)
/// - `400 Bad Request` when `total_questions` differs from the quiz's own count
/// - `409 Conflict` once the attempt limit is reached
pub async fn submit_attempt(
    State(app_state): State<AppState>,
    Path(quiz_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Response {
    match app_state
        .content()
        .record_quiz_attempt(req.student_id, quiz_id, req.correct_answers, req.total_questions)
        .await
    {
        Ok(attempt) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(attempt, "Attempt recorded")),
        )
            .into_response(),
        Err(err) => content_error(err),
    }
}
