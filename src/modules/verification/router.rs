use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use super::handlers;
use crate::shared::state::AppState;

// Multipart bodies carry up to a handful of 5 MiB documents; the per-file
// ceiling is enforced by the validation gate.
const UPLOAD_BODY_LIMIT: usize = 32 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submissions", post(handlers::submit))
        .route("/status", get(handlers::status))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/submissions", get(handlers::admin_list))
        .route("/submissions/:id", get(handlers::admin_detail))
        .route("/submissions/:id/approve", post(handlers::admin_approve))
        .route("/submissions/:id/reject", post(handlers::admin_reject))
        .route("/submissions/:id/audit", get(handlers::admin_audit))
}
