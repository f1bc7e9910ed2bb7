//! Password-reset OTP endpoints.
//!
//! - `POST /api/request-reset` → `request_reset`
//! - `POST /api/verify-otp` → `verify_otp`

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use services::password_reset::PasswordResetError;
use validator::Validate;

use crate::response::ApiResponse;
use crate::routes::common::validation_failed;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/request-reset", post(request_reset))
        .route("/verify-otp", post(verify_otp))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Default, Serialize)]
pub struct VerifyOtpResponse {
    pub user_id: i64,
}

fn reset_error(err: PasswordResetError) -> Response {
    let status = match &err {
        PasswordResetError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        PasswordResetError::InvalidCode => StatusCode::BAD_REQUEST,
        PasswordResetError::Mail(e) => {
            tracing::error!(error = %e, "reset email failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PasswordResetError::Database(e) => {
            tracing::error!(error = %e, "reset request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::<()>::error(err.to_string()))).into_response()
}

/// POST /api/request-reset
///
/// Issues a 6-digit code and mails it. Unknown addresses get the same
/// response as known ones.
///
/// ### Request Body
/// ```json
/// { "email": "parent@example.com" }
/// ```
///
/// ### Responses
/// - `200 OK` → `{ "success": true, "data": null, "message": "If the account exists, a reset code has been sent." }`
/// - `400 Bad Request` (invalid email)
/// - `429 Too Many Requests` (more than the hourly limit)
/// - `500 Internal Server Error`
pub async fn request_reset(
    State(app_state): State<AppState>,
    Json(req): Json<RequestResetRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_failed(&errors);
    }

    match app_state.password_reset().request_reset(&req.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::success(
                (),
                "If the account exists, a reset code has been sent.",
            )),
        )
            .into_response(),
        Err(err) => reset_error(err),
    }
}

/// POST /api/verify-otp
///
/// Consumes a reset code. A code verifies at most once.
///
/// ### Request Body
/// ```json
/// { "email": "parent@example.com", "otp": "042917" }
/// ```
///
/// ### Responses
/// - `200 OK` → `{ "success": true, "data": { "user_id": 7 }, "message": "Code verified" }`
/// - `400 Bad Request` (malformed, wrong, expired or used code)
pub async fn verify_otp(
    State(app_state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Response {
    if let Err(errors) = req.validate() {
        return validation_failed(&errors);
    }

    match app_state.password_reset().verify_otp(&req.email, &req.otp).await {
        Ok(user_id) => (
            StatusCode::OK,
            Json(ApiResponse::success(VerifyOtpResponse { user_id }, "Code verified")),
        )
            .into_response(),
        Err(err) => reset_error(err),
    }
}
