//! Axum route handlers for the Resume API.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Multipart, Path, State},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::extract_text;
use crate::generation::service::SectionSuggestions;
use crate::generation::template_style::{template_catalog, TemplateInfo, TemplateStyle};
use crate::models::resume::{JobDescriptionRow, ResumeRow, ResumeVersionRow};
use crate::resume::sections::{is_known_section, skeleton_content, SECTIONS};
use crate::resume::versioning::{create_resume, get_history, update_section, NewResume};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScratchRequest {
    pub job_role: String,
    pub experience_level: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSectionRequest {
    pub section_name: String,
    pub content: Value,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub section_name: String,
    #[serde(default)]
    pub current_content: Option<Value>,
    pub job_role: String,
    pub experience_level: String,
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobForm {
    pub text_content: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resume/upload
///
/// Stores the file, extracts its text, and parses it into structured JSON.
pub async fn handle_upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ResumeRow>, AppError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read uploaded file: {e}")))?;
        upload = Some((file_name, content_type, bytes.to_vec()));
        break;
    }
    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::Validation("A 'file' field is required".to_string()))?;

    let file_path = upload_path(&state.config.upload_dir, user.id, &file_name);
    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let text = extract_text(&file_path, &content_type).await;
    if text.is_empty() {
        return Err(AppError::Validation("Could not extract text from file".to_string()));
    }

    let parsed = state.ai.parse_resume(&text).await?;

    let file_path = file_path.to_string_lossy();
    let resume = create_resume(
        &state.db,
        NewResume {
            user_id: user.id,
            file_path: Some(&file_path),
            raw_text: Some(&text),
            parsed_content: &parsed,
            template_id: TemplateStyle::default().id(),
            is_draft: false,
            meta_data: None,
        },
    )
    .await?;
    Ok(Json(resume))
}

/// POST /api/v1/resume/scratch
///
/// Starts an empty draft resume; the setup answers are kept in `meta_data`.
pub async fn handle_scratch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ScratchRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    if req.job_role.trim().is_empty() || req.experience_level.trim().is_empty() {
        return Err(AppError::Validation(
            "job_role and experience_level are required".to_string(),
        ));
    }

    let style = TemplateStyle::from_id(req.template_id.as_deref());
    let meta = json!({
        "job_role": req.job_role.trim(),
        "experience_level": req.experience_level.trim(),
        "industry": req.industry.as_deref().map(str::trim),
    });
    let resume = create_resume(
        &state.db,
        NewResume {
            user_id: user.id,
            file_path: None,
            raw_text: None,
            parsed_content: &skeleton_content(),
            template_id: style.id(),
            is_draft: true,
            meta_data: Some(&meta),
        },
    )
    .await?;
    Ok(Json(resume))
}

/// PATCH /api/v1/resume/:id/update-section
pub async fn handle_update_section(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
    Json(req): Json<UpdateSectionRequest>,
) -> Result<Json<ResumeRow>, AppError> {
    ensure_known_section(&req.section_name)?;
    let resume = update_section(&state.db, user.id, resume_id, &req.section_name, req.content)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    Ok(Json(resume))
}

/// GET /api/v1/resume/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<ResumeVersionRow>>, AppError> {
    let versions = get_history(&state.db, user.id, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    Ok(Json(versions))
}

/// POST /api/v1/resume/ai-assistant
pub async fn handle_ai_assistant(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(req): Json<AssistantRequest>,
) -> Result<Json<SectionSuggestions>, AppError> {
    ensure_known_section(&req.section_name)?;
    if req.job_role.trim().is_empty() {
        return Err(AppError::Validation("job_role is required".to_string()));
    }

    let role = role_with_industry(&req.job_role, req.industry.as_deref());
    let suggestions = state
        .ai
        .get_section_suggestions(
            &req.section_name,
            &role,
            req.experience_level.trim(),
            req.current_content.as_ref(),
        )
        .await?;
    Ok(Json(suggestions))
}

/// GET /api/v1/resume/templates
pub async fn handle_templates() -> Json<Vec<TemplateInfo>> {
    Json(template_catalog())
}

/// POST /api/v1/resume/job
pub async fn handle_submit_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<JobForm>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    if form.text_content.trim().is_empty() {
        return Err(AppError::Validation("text_content cannot be empty".to_string()));
    }

    let job = sqlx::query_as::<_, JobDescriptionRow>(
        r#"
        INSERT INTO job_descriptions (id, user_id, text_content, position, company)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&form.text_content)
    .bind(label_or(form.position.as_deref(), "Job Role"))
    .bind(label_or(form.company.as_deref(), "Company"))
    .fetch_one(&state.db)
    .await?;
    Ok(Json(job))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn ensure_known_section(section: &str) -> Result<(), AppError> {
    if is_known_section(section) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unknown section '{section}'. Expected one of: {}",
            SECTIONS.join(", ")
        )))
    }
}

/// `{upload_dir}/{user_id}_{file name}`, with the client-supplied name reduced
/// to a safe basename.
fn upload_path(upload_dir: &str, user_id: Uuid, file_name: &str) -> PathBuf {
    let base = FsPath::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut safe: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    if safe.trim_matches('.').is_empty() {
        safe = "resume".to_string();
    }
    FsPath::new(upload_dir).join(format!("{user_id}_{safe}"))
}

fn label_or<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => default,
    }
}

fn role_with_industry(job_role: &str, industry: Option<&str>) -> String {
    match industry.map(str::trim) {
        Some(industry) if !industry.is_empty() => format!("{} ({industry})", job_role.trim()),
        _ => job_role.trim().to_string(),
    }
}
