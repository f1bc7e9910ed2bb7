//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → liveness and store reachability
//! - `/request-reset`, `/verify-otp` → password-reset codes
//! - `/subjects` → fallback-aware module listings and subject progress
//! - `/modules` → module authoring, student and class progress
//! - `/lessons` → lesson authoring and completions
//! - `/quizzes` → quiz authoring and attempts

use axum::Router;

use crate::routes::{
    auth::auth_routes, health::health_routes, lessons::lesson_routes, modules::module_routes,
    quizzes::quiz_routes, subjects::subject_routes,
};
use crate::state::AppState;

pub mod auth;
pub mod common;
pub mod health;
pub mod lessons;
pub mod modules;
pub mod quizzes;
pub mod subjects;

/// Builds every `/api` route over `app_state`.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .merge(auth_routes())
        .nest("/subjects", subject_routes())
        .nest("/modules", module_routes())
        .nest("/lessons", lesson_routes())
        .nest("/quizzes", quiz_routes())
        .with_state(app_state)
}
