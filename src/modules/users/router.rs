use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::handlers;
use crate::shared::state::AppState;

// Instructor registration carries the first document batch.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/student", post(handlers::register_student))
        .route("/register/instructor", post(handlers::register_instructor))
        .route(
            "/profile",
            get(handlers::get_profile).patch(handlers::update_profile),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
