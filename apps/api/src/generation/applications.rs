//! Application persistence. Status updates are guarded in SQL so a terminal
//! status is never overwritten, whoever writes second.

use anyhow::Result;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::generation::ats::AtsReport;
use crate::generation::template_style::TemplateStyle;
use crate::models::application::{ApplicationRow, ApplicationStatus};

/// Everything the worker needs to generate one Application.
#[derive(Debug, Clone, FromRow)]
pub struct GenerationJob {
    pub status: String,
    pub template_id: String,
    pub parsed_content: Option<Value>,
    pub raw_text: Option<String>,
    pub job_text: String,
    pub position: String,
}

/// Inserts a new Application in `processing` state.
/// Caller must have checked that resume and job belong to `user_id`.
pub async fn insert_application(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    job_id: Uuid,
    style: TemplateStyle,
) -> Result<ApplicationRow, sqlx::Error> {
    sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, user_id, resume_id, job_id, template_id, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(resume_id)
    .bind(job_id)
    .bind(style.id())
    .bind(ApplicationStatus::Processing.as_str())
    .fetch_one(pool)
    .await
}

/// Fetches one Application, scoped to its owner.
pub async fn get_application(
    pool: &PgPool,
    user_id: Uuid,
    application_id: Uuid,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1 AND user_id = $2")
        .bind(application_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_generation_job(pool: &PgPool, application_id: Uuid) -> Result<Option<GenerationJob>> {
    Ok(sqlx::query_as::<_, GenerationJob>(
        r#"
        SELECT a.status, a.template_id, r.parsed_content, r.raw_text,
               j.text_content AS job_text, j.position
        FROM applications a
        JOIN resumes r ON r.id = a.resume_id
        JOIN job_descriptions j ON j.id = a.job_id
        WHERE a.id = $1
        "#,
    )
    .bind(application_id)
    .fetch_optional(pool)
    .await?)
}

/// Moves a pending Application to processing. No-op for any other state.
pub async fn mark_processing(pool: &PgPool, application_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE applications SET status = 'processing', updated_at = NOW() WHERE id = $1 AND status = 'pending'",
    )
    .bind(application_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Stores the generated resume and score. Returns false if the row was already terminal.
pub async fn mark_completed(
    pool: &PgPool,
    application_id: Uuid,
    generated_content: &Value,
    ats: &AtsReport,
) -> Result<bool> {
    let feedback = serde_json::to_value(ats)?;
    let result = sqlx::query(
        r#"
        UPDATE applications
        SET status = 'completed', generated_content = $2, ats_score = $3,
            ats_feedback = $4, error_message = NULL, updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'processing')
        "#,
    )
    .bind(application_id)
    .bind(generated_content)
    .bind(i32::from(ats.score))
    .bind(&feedback)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Records a failure. Returns false if the row was already terminal.
pub async fn mark_failed(pool: &PgPool, application_id: Uuid, error_message: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE applications
        SET status = 'failed', error_message = $2, updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'processing')
        "#,
    )
    .bind(application_id)
    .bind(error_message)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Ids of Applications that never reached a terminal state, oldest first.
pub async fn list_unfinished(pool: &PgPool) -> Result<Vec<Uuid>> {
    Ok(sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM applications WHERE status IN ('pending', 'processing') ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?)
}
