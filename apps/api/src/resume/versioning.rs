use anyhow::Result;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, ResumeVersionRow};
use crate::resume::sections::apply_section;

/// Fields of a resume being created.
pub struct NewResume<'a> {
    pub user_id: Uuid,
    pub file_path: Option<&'a str>,
    pub raw_text: Option<&'a str>,
    pub parsed_content: &'a Value,
    pub template_id: &'a str,
    pub is_draft: bool,
    pub meta_data: Option<&'a Value>,
}

/// Inserts a resume at version 1 together with its first snapshot.
pub async fn create_resume(pool: &PgPool, new: NewResume<'_>) -> Result<ResumeRow> {
    let mut tx = pool.begin().await?;

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (id, user_id, file_path, raw_text, parsed_content, template_id, is_draft, meta_data, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(new.file_path)
    .bind(new.raw_text)
    .bind(new.parsed_content)
    .bind(new.template_id)
    .bind(new.is_draft)
    .bind(new.meta_data)
    .fetch_one(&mut *tx)
    .await?;

    insert_snapshot(&mut tx, resume.id, resume.version, new.parsed_content).await?;
    tx.commit().await?;

    info!("Created resume {} for user {}", resume.id, resume.user_id);
    Ok(resume)
}

/// Replaces one section and bumps the version. `None` if the resume is not the user's.
///
/// The row is locked for the duration so concurrent edits get consecutive versions.
/// Snapshots are append-only: earlier versions are never touched.
pub async fn update_section(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
    section: &str,
    content: Value,
) -> Result<Option<ResumeRow>> {
    let mut tx = pool.begin().await?;

    let current: Option<(Option<Value>,)> = sqlx::query_as(
        "SELECT parsed_content FROM resumes WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((parsed_content,)) = current else {
        return Ok(None);
    };

    let updated_content = apply_section(parsed_content.as_ref(), section, content);

    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes
        SET parsed_content = $2, version = version + 1, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(&updated_content)
    .fetch_one(&mut *tx)
    .await?;

    insert_snapshot(&mut tx, resume.id, resume.version, &updated_content).await?;
    tx.commit().await?;

    info!("Resume {resume_id} section '{section}' updated to version {}", resume.version);
    Ok(Some(resume))
}

/// All snapshots of a resume, newest first. `None` if the resume is not the user's.
pub async fn get_history(
    pool: &PgPool,
    user_id: Uuid,
    resume_id: Uuid,
) -> Result<Option<Vec<ResumeVersionRow>>> {
    let owned = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM resumes WHERE id = $1 AND user_id = $2)",
    )
    .bind(resume_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    if !owned {
        return Ok(None);
    }

    let versions = sqlx::query_as::<_, ResumeVersionRow>(
        "SELECT * FROM resume_versions WHERE resume_id = $1 ORDER BY version DESC",
    )
    .bind(resume_id)
    .fetch_all(pool)
    .await?;
    Ok(Some(versions))
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Postgres>,
    resume_id: Uuid,
    version: i32,
    content: &Value,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO resume_versions (id, resume_id, version, content) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(version)
    .bind(content)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
