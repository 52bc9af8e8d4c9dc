use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::job_roles::search::{metadata, search_roles, select_role, JobRoleMetadata};
use crate::models::job_role::{JobRoleRow, JobRoleSuggestion};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub name: String,
}

/// GET /api/v1/job-roles/search?q=
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<JobRoleSuggestion>>, AppError> {
    let results = search_roles(
        state.catalog.as_ref(),
        &state.ai,
        &state.role_cache,
        &params.q,
    )
    .await?;
    Ok(Json(results))
}

/// GET /api/v1/job-roles/metadata
pub async fn handle_metadata(State(state): State<AppState>) -> Result<Json<JobRoleMetadata>, AppError> {
    Ok(Json(metadata(state.catalog.as_ref()).await?))
}

/// POST /api/v1/job-roles/select
pub async fn handle_select(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(req): Json<SelectRequest>,
) -> Result<Json<JobRoleRow>, AppError> {
    Ok(Json(select_role(state.catalog.as_ref(), &req.name).await?))
}
