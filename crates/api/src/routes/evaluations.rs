use axum::routing::{get, post};
use axum::Router;

use crate::handlers::evaluations;
use crate::state::AppState;

/// Routes mounted at `/evaluations`.
///
/// ```text
/// GET    /                -> list_evaluations
/// POST   /                -> create_evaluation
/// GET    /{id}            -> get_evaluation
/// POST   /{id}/run        -> run_evaluation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(evaluations::list_evaluations).post(evaluations::create_evaluation),
        )
        .route("/{id}", get(evaluations::get_evaluation))
        .route("/{id}/run", post(evaluations::run_evaluation))
}
