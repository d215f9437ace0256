use axum::{Router, routing::get};

use crate::modules::{users, verification};
use crate::shared::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/users", users::router::router())
        .nest("/verification", verification::router::router())
        .nest("/admin/verification", verification::router::admin_router())
        .with_state(state)
}
