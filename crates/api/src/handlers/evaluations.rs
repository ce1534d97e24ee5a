//! Handlers for the `/evaluations` resource.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use promptdash_core::evaluation::{EvaluationListParams, NewEvaluation, EVALUATION_ENTITY};

use crate::error::{AppError, AppResult};
use crate::handlers::parse_id;
use crate::state::AppState;

/// Minimum number of distinct models an evaluation must compare.
pub const MIN_DISTINCT_MODELS: usize = 2;

/// GET /api/evaluations
///
/// Filtered, paginated listing in store order (newest first).
pub async fn list_evaluations(
    State(state): State<AppState>,
    Query(params): Query<EvaluationListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.service.list_evaluations(&params).await?;
    Ok(Json(page))
}

/// POST /api/evaluations
///
/// Create a QUEUED evaluation. Returns 201 with the stored record.
pub async fn create_evaluation(
    State(state): State<AppState>,
    Json(input): Json<NewEvaluation>,
) -> AppResult<impl IntoResponse> {
    // An empty list is left to input validation.
    let distinct = input.models.iter().collect::<HashSet<_>>().len();
    if distinct > 0 && distinct < MIN_DISTINCT_MODELS {
        return Err(AppError::BadRequest(format!(
            "select at least {MIN_DISTINCT_MODELS} different models"
        )));
    }

    let evaluation = state.service.create_evaluation(input).await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// GET /api/evaluations/{id}
pub async fn get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(EVALUATION_ENTITY, &id)?;
    let evaluation = state.service.get_evaluation(id).await?;
    Ok(Json(evaluation))
}

/// POST /api/evaluations/{id}/run
///
/// Move a QUEUED evaluation to RUNNING. Scores are written on completion.
pub async fn run_evaluation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(EVALUATION_ENTITY, &id)?;
    let ack = state.service.run_evaluation(id).await?;
    Ok(Json(ack))
}
