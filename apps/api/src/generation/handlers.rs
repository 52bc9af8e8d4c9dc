//! Axum route handlers for tailored-resume generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::generation::applications::{get_application, insert_application, mark_failed};
use crate::generation::queue::enqueue_or_fail;
use crate::generation::template_style::TemplateStyle;
use crate::models::application::ApplicationRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub resume_id: Uuid,
    pub job_id: Uuid,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// POST /api/v1/resume/generate
///
/// Creates an Application in `processing` state and queues it for the worker.
/// Returns 202 immediately; poll `/resume/application/:id` for the result.
pub async fn handle_generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<GenerateForm>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let resume_owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM resumes WHERE id = $1 AND user_id = $2)",
    )
    .bind(form.resume_id)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;
    if !resume_owned {
        return Err(AppError::NotFound("Resume not found".to_string()));
    }

    let job_owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM job_descriptions WHERE id = $1 AND user_id = $2)",
    )
    .bind(form.job_id)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;
    if !job_owned {
        return Err(AppError::NotFound("Job description not found".to_string()));
    }

    let style = TemplateStyle::from_id(form.template_id.as_deref());
    let application =
        insert_application(&state.db, user.id, form.resume_id, form.job_id, style).await?;

    let application_id = application.id;
    let db = state.db.clone();
    enqueue_or_fail(state.queue.as_ref(), application_id, move |message| async move {
        mark_failed(&db, application_id, &message).await
    })
    .await?;
    tracing::info!(
        "Queued application {} ({} queue, style {})",
        application.id,
        state.queue.backend(),
        style.id()
    );

    Ok((StatusCode::ACCEPTED, Json(application)))
}

/// GET /api/v1/resume/application/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application = get_application(&state.db, user.id, application_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
    Ok(Json(application))
}
