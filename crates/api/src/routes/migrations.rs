use axum::routing::{get, post};
use axum::Router;

use crate::handlers::migrations;
use crate::state::AppState;

/// Routes mounted at `/migrations`.
///
/// ```text
/// GET    /                -> list_migrations
/// POST   /                -> create_migration
/// GET    /{id}            -> get_migration
/// POST   /{id}/start      -> start_migration
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(migrations::list_migrations).post(migrations::create_migration),
        )
        .route("/{id}", get(migrations::get_migration))
        .route("/{id}/start", post(migrations::start_migration))
}
