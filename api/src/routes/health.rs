use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    /// `"up"` when the store answered a ping. Reads degrade rather than fail, so
    /// the service reports healthy either way.
    pub store: &'static str,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// GET /api/health
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "ok", "store": "up" },
///   "message": "Health check passed"
/// }
/// ```
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    let store = match app_state.read().conn().ping().await {
        Ok(()) => "up",
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            "down"
        }
    };

    Json(ApiResponse::success(
        HealthReport { status: "ok", store },
        "Health check passed",
    ))
}
