pub mod evaluations;
pub mod health;
pub mod migrations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /migrations                     list, create
/// /migrations/{id}                get
/// /migrations/{id}/start          start (POST)
///
/// /evaluations                    list, create
/// /evaluations/{id}               get
/// /evaluations/{id}/run           run (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/migrations", migrations::router())
        .nest("/evaluations", evaluations::router())
}
