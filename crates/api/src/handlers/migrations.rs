//! Handlers for the `/migrations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use promptdash_core::migration::{MigrationListParams, NewMigration, MIGRATION_ENTITY};

use crate::error::AppResult;
use crate::handlers::parse_id;
use crate::state::AppState;

/// GET /api/migrations
///
/// Filtered, sorted, paginated listing. Defaults to `createdAt` descending.
pub async fn list_migrations(
    State(state): State<AppState>,
    Query(params): Query<MigrationListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.service.list_migrations(&params).await?;
    Ok(Json(page))
}

/// POST /api/migrations
///
/// Create a DRAFT migration. Returns 201 with the stored record.
pub async fn create_migration(
    State(state): State<AppState>,
    Json(input): Json<NewMigration>,
) -> AppResult<impl IntoResponse> {
    let migration = state.service.create_migration(input).await?;
    Ok((StatusCode::CREATED, Json(migration)))
}

/// GET /api/migrations/{id}
pub async fn get_migration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(MIGRATION_ENTITY, &id)?;
    let migration = state.service.get_migration(id).await?;
    Ok(Json(migration))
}

/// POST /api/migrations/{id}/start
///
/// Move a DRAFT migration to RUNNING. Completion happens in the background.
pub async fn start_migration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(MIGRATION_ENTITY, &id)?;
    let ack = state.service.start_migration(id).await?;
    Ok(Json(ack))
}
