//! Generation worker: turns one queued Application id into a tailored, scored resume.
//!
//! Flow per id: load job → generate_tailored_resume → calculate_ats_score → persist.
//! Each id runs in its own task against the worker's own pool. Any error ends in
//! `failed` with the message stored; nothing propagates past `process`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::generation::applications::{
    load_generation_job, mark_completed, mark_failed, mark_processing, GenerationJob,
};
use crate::generation::ats::AtsReport;
use crate::generation::service::AiService;
use crate::generation::template_style::TemplateStyle;
use crate::llm_client::LlmError;
use crate::models::application::ApplicationStatus;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI provider error: {0}")]
    Llm(#[from] LlmError),

    #[error("model output could not be parsed")]
    UnparseableOutput,
}

/// Inputs for one generation run, detached from the database rows.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub resume_content: Value,
    pub job_text: String,
    pub job_role: String,
    pub style: TemplateStyle,
}

impl From<GenerationJob> for GenerationInput {
    fn from(job: GenerationJob) -> Self {
        let resume_content = job
            .parsed_content
            .unwrap_or_else(|| json!({ "raw_text": job.raw_text.unwrap_or_default() }));
        Self {
            resume_content,
            job_text: job.job_text,
            job_role: job.position,
            style: TemplateStyle::from_id(Some(&job.template_id)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub generated_content: Value,
    pub ats: AtsReport,
}

/// Tailors the resume, then scores the tailored version against the job.
///
/// A tailored resume must be a JSON object. Fallback advice, or a bare string,
/// list or number from the model, fails the run instead of completing it.
pub async fn run_generation(
    ai: &AiService,
    input: &GenerationInput,
) -> Result<GenerationOutcome, GenerationError> {
    let tailored = ai
        .generate_tailored_resume(
            &input.resume_content,
            &input.job_text,
            &input.job_role,
            input.style,
        )
        .await?;

    if tailored.degraded || !tailored.value.is_object() {
        return Err(GenerationError::UnparseableOutput);
    }

    let resume_text = serde_json::to_string_pretty(&tailored.value).map_err(LlmError::from)?;
    let ats = ai.calculate_ats_score(&resume_text, &input.job_text).await?;
    if ats.degraded {
        warn!("ATS scoring output was unparseable; storing an empty, flagged report");
    }

    Ok(GenerationOutcome {
        generated_content: tailored.value,
        ats,
    })
}

/// Executes queued generation jobs. Cheap to clone.
#[derive(Clone)]
pub struct GenerationWorker {
    pool: PgPool,
    ai: AiService,
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl GenerationWorker {
    pub fn new(pool: PgPool, ai: AiService) -> Self {
        Self {
            pool,
            ai,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Spawns an independent task for one Application id.
    pub fn dispatch(&self, application_id: Uuid) {
        let worker = self.clone();
        tokio::spawn(async move { worker.process(application_id).await });
    }

    /// Runs one Application to a terminal state. Duplicate ids already being
    /// processed by this worker are skipped.
    pub async fn process(&self, application_id: Uuid) {
        if !self.claim(application_id) {
            info!("Application {application_id} is already being generated, skipping duplicate");
            return;
        }
        if let Err(e) = self.process_claimed(application_id).await {
            error!("Error in background generation for application {application_id}: {e:#}");
            if let Err(e) = mark_failed(&self.pool, application_id, &e.to_string()).await {
                error!("Could not mark application {application_id} as failed: {e:#}");
            }
        }
        self.release(application_id);
    }

    async fn process_claimed(&self, application_id: Uuid) -> anyhow::Result<()> {
        let job = match load_generation_job(&self.pool, application_id).await? {
            Some(job) => job,
            None => {
                warn!("Application {application_id} not found in worker");
                return Ok(());
            }
        };

        let status = job
            .status
            .parse::<ApplicationStatus>()
            .map_err(anyhow::Error::msg)?;
        if status.is_terminal() {
            info!("Application {application_id} is already {status}, nothing to do");
            return Ok(());
        }
        if status.can_transition_to(ApplicationStatus::Processing) {
            mark_processing(&self.pool, application_id).await?;
        }

        info!("Generating application {application_id}");
        let outcome = run_generation(&self.ai, &GenerationInput::from(job)).await?;

        let stored = mark_completed(
            &self.pool,
            application_id,
            &outcome.generated_content,
            &outcome.ats,
        )
        .await?;
        if stored {
            info!(
                "Application {application_id} completed with ATS score {}",
                outcome.ats.score
            );
        } else {
            warn!("Application {application_id} reached a terminal state elsewhere; result discarded");
        }
        Ok(())
    }

    fn claim(&self, application_id: Uuid) -> bool {
        match self.in_flight.lock() {
            Ok(mut set) => set.insert(application_id),
            Err(poisoned) => poisoned.into_inner().insert(application_id),
        }
    }

    fn release(&self, application_id: Uuid) {
        match self.in_flight.lock() {
            Ok(mut set) => set.remove(&application_id),
            Err(poisoned) => poisoned.into_inner().remove(&application_id),
        };
    }
}
