use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, patch, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/entries", get(handlers::list_entries).post(handlers::add_entry))
        .route(
            "/api/entries/:id",
            patch(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/reload", post(handlers::reload))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/derive", get(handlers::derive))
        .with_state(state)
}
