//! AI orchestration: the five model-backed operations.
//!
//! Each operation: build a deterministic prompt → `LlmClient::generate` → `normalize`.
//! Structured operations are retried on transient provider errors; unparseable
//! output is never an error (see `llm_client::normalize`).

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::generation::ats::{string_list, AtsReport};
use crate::generation::prompts::{
    fill, truncate_chars, ATS_SCORE_PROMPT, JOB_TEXT_LIMIT, PARSE_RESUME_PROMPT, RESUME_TEXT_LIMIT,
    SECTION_SUGGESTIONS_PROMPT, SUGGEST_ROLES_PROMPT, TAILOR_RESUME_PROMPT,
};
use crate::generation::retry::{with_retry, RetryPolicy};
use crate::generation::template_style::TemplateStyle;
use crate::llm_client::{normalize, LlmClient, LlmError, Normalized};

/// Output of the section assistant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSuggestions {
    pub suggestions: Vec<String>,
    pub tips: Vec<String>,
    /// A string for text sections; may be a list or object for structured sections.
    pub improved_content: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl SectionSuggestions {
    fn from_normalized(normalized: Normalized) -> Self {
        let Normalized { value, degraded } = normalized;
        Self {
            suggestions: string_list(&value, "suggestions"),
            tips: string_list(&value, "tips"),
            improved_content: value.get("improved_content").cloned().unwrap_or(Value::Null),
            degraded,
        }
    }
}

/// The AI orchestrator shared by request handlers and the generation worker.
#[derive(Clone)]
pub struct AiService {
    llm: LlmClient,
    retry: RetryPolicy,
}

impl AiService {
    pub fn new(llm: LlmClient, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub fn backend(&self) -> &'static str {
        self.llm.backend()
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Calls the model with retry, prefixes the completion, and normalizes it.
    async fn generate_json(
        &self,
        label: &str,
        prompt: &str,
        prefill: &str,
    ) -> Result<Normalized, LlmError> {
        let llm = &self.llm;
        let text = with_retry(&self.retry, label, || llm.generate(prompt)).await?;
        let normalized = normalize(&format!("{prefill}{text}"));
        if normalized.degraded {
            warn!("{label}: model output degraded to fallback payload");
        }
        Ok(normalized)
    }

    /// Extracts structured resume JSON from raw resume text.
    pub async fn parse_resume(&self, text: &str) -> Result<Value, LlmError> {
        let prompt = fill(
            PARSE_RESUME_PROMPT,
            &[("resume_text", truncate_chars(text, RESUME_TEXT_LIMIT))],
        );
        let normalized = self.generate_json("parse_resume", &prompt, "").await?;
        Ok(normalized.value)
    }

    /// Suggestions, tips and a rewrite for one resume section.
    pub async fn get_section_suggestions(
        &self,
        section_name: &str,
        job_role: &str,
        experience_level: &str,
        current_content: Option<&Value>,
    ) -> Result<SectionSuggestions, LlmError> {
        let current = match current_content {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let prompt = fill(
            SECTION_SUGGESTIONS_PROMPT,
            &[
                ("job_role", job_role),
                ("experience_level", experience_level),
                ("section_name", section_name),
                ("current_content", &current),
            ],
        );

        // The prompt pre-fills `{`; put it back in front of the completion.
        let normalized = self
            .generate_json("get_section_suggestions", &prompt, "{")
            .await?;
        Ok(SectionSuggestions::from_normalized(normalized))
    }

    /// Rewrites a structured resume for a job. Style changes tone only, not the schema.
    pub async fn generate_tailored_resume(
        &self,
        resume_json: &Value,
        job_text: &str,
        job_role: &str,
        style: TemplateStyle,
    ) -> Result<Normalized, LlmError> {
        let resume_str = serde_json::to_string(resume_json)?;
        let prompt = fill(
            TAILOR_RESUME_PROMPT,
            &[
                ("job_role", job_role),
                ("template_id", style.id()),
                ("density_instruction", style.density_instruction()),
                ("job_text", truncate_chars(job_text, JOB_TEXT_LIMIT)),
                ("resume_json", &resume_str),
            ],
        );

        info!("Tailoring resume for role '{job_role}' with style {}", style.id());
        self.generate_json("generate_tailored_resume", &prompt, "")
            .await
    }

    /// Scores a resume against a job description.
    pub async fn calculate_ats_score(
        &self,
        resume_text: &str,
        job_text: &str,
    ) -> Result<AtsReport, LlmError> {
        let prompt = fill(
            ATS_SCORE_PROMPT,
            &[("job_text", job_text), ("resume_text", resume_text)],
        );
        let normalized = self.generate_json("calculate_ats_score", &prompt, "").await?;

        if normalized.degraded {
            return Ok(AtsReport {
                degraded: true,
                ..AtsReport::default()
            });
        }
        Ok(AtsReport::from_value(&normalized.value))
    }

    /// Role titles related to an autocomplete query. Anything but a JSON array yields `[]`.
    /// Not retried: autocomplete is best-effort.
    pub async fn suggest_job_roles(&self, query: &str) -> Result<Vec<String>, LlmError> {
        let prompt = fill(SUGGEST_ROLES_PROMPT, &[("query", query)]);
        let text = self.llm.generate(&prompt).await?;

        let roles = match normalize(&text).value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::{unavailable, ScriptedGenerator};

    fn service(generator: Arc<ScriptedGenerator>) -> AiService {
        AiService::new(LlmClient::new(generator), RetryPolicy::immediate(3))
    }

    #[tokio::test]
    async fn test_parse_resume_returns_structured_json() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            "```json\n{\"full_name\": \"Ada Lovelace\", \"skills\": [\"Math\"]}\n```",
        ]));
        let ai = service(generator.clone());

        let parsed = ai.parse_resume("Ada Lovelace\nSkills: Math").await.unwrap();
        assert_eq!(parsed["full_name"], "Ada Lovelace");
        assert!(generator.prompts()[0].contains("Skills: Math"));
    }

    #[tokio::test]
    async fn test_parse_resume_truncates_long_input() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{}"]));
        let ai = service(generator.clone());

        let long_text = "x".repeat(RESUME_TEXT_LIMIT + 500);
        ai.parse_resume(&long_text).await.unwrap();
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains(&"x".repeat(RESUME_TEXT_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(RESUME_TEXT_LIMIT + 1)));
    }

    #[tokio::test]
    async fn test_parse_resume_retries_transient_errors() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Ok("{\"full_name\": \"Grace\"}".to_string()),
        ]));
        let ai = service(generator.clone());

        let parsed = ai.parse_resume("Grace Hopper").await.unwrap();
        assert_eq!(parsed["full_name"], "Grace");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_parse_resume_propagates_after_exhaustion() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Err(unavailable()),
            Err(unavailable()),
            Err(unavailable()),
        ]));
        let ai = service(generator.clone());

        assert!(ai.parse_resume("text").await.is_err());
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_resume_degrades_to_fallback() {
        let generator = Arc::new(ScriptedGenerator::replying(&["I cannot read this resume."]));
        let ai = service(generator);

        let parsed = ai.parse_resume("text").await.unwrap();
        assert!(parsed.get("suggestions").is_some());
    }

    #[tokio::test]
    async fn test_section_suggestions_restore_prefilled_brace() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            "\"suggestions\": [\"Led migrations\"], \"tips\": [\"Be brief\"], \"improved_content\": \"Backend engineer.\"}",
        ]));
        let ai = service(generator.clone());

        let result = ai
            .get_section_suggestions(
                "summary",
                "Backend Developer",
                "Senior",
                Some(&json!("I write code")),
            )
            .await
            .unwrap();
        assert_eq!(result.suggestions, vec!["Led migrations"]);
        assert_eq!(result.tips, vec!["Be brief"]);
        assert_eq!(result.improved_content, json!("Backend engineer."));
        assert!(!result.degraded);

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Current Content: \"I write code\""));
        assert!(prompt.contains("Experience Level: Senior"));
    }

    #[tokio::test]
    async fn test_section_suggestions_fallback_is_flagged() {
        let generator = Arc::new(ScriptedGenerator::replying(&["sorry, no idea"]));
        let ai = service(generator);

        let result = ai
            .get_section_suggestions("skills", "Nurse", "Junior", None)
            .await
            .unwrap();
        assert!(result.degraded);
        assert_eq!(result.suggestions.len(), 3);
        assert_eq!(result.tips.len(), 2);
    }

    #[tokio::test]
    async fn test_tailoring_prompt_varies_by_style_only() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{\"summary\": \"a\"}", "{\"summary\": \"b\"}"]));
        let ai = service(generator.clone());
        let resume = json!({"full_name": "Ada", "summary": "Engineer"});

        ai.generate_tailored_resume(&resume, "We need Rust", "Engineer", TemplateStyle::LeadershipEdge)
            .await
            .unwrap();
        ai.generate_tailored_resume(&resume, "We need Rust", "Engineer", TemplateStyle::Academic)
            .await
            .unwrap();

        let prompts = generator.prompts();
        assert!(prompts[0].contains("Style: leadership-edge (Achievement-focused, executive tone"));
        assert!(prompts[1].contains("Style: academic (Detailed, formal"));
        assert!(prompts[0].contains("\"full_name\":\"Ada\""));
    }

    #[tokio::test]
    async fn test_tailoring_truncates_job_text() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{}"]));
        let ai = service(generator.clone());
        let job = "j".repeat(JOB_TEXT_LIMIT * 2);

        ai.generate_tailored_resume(&json!({}), &job, "Role", TemplateStyle::default())
            .await
            .unwrap();
        assert!(!generator.prompts()[0].contains(&"j".repeat(JOB_TEXT_LIMIT + 1)));
    }

    #[tokio::test]
    async fn test_job_text_placeholder_names_stay_literal() {
        let generator = Arc::new(ScriptedGenerator::replying(&["{}", "{\"score\": 50}"]));
        let ai = service(generator.clone());
        let resume = json!({"full_name": "RESUME_BODY"});

        ai.generate_tailored_resume(&resume, "Apply via {resume_json} now", "Role", TemplateStyle::default())
            .await
            .unwrap();
        ai.calculate_ats_score("MY_RESUME", "Requirements: {resume_text}")
            .await
            .unwrap();

        let prompts = generator.prompts();
        assert_eq!(prompts[0].matches("RESUME_BODY").count(), 1);
        assert!(prompts[0].contains("Apply via {resume_json} now"));
        assert_eq!(prompts[1].matches("MY_RESUME").count(), 1);
        assert!(prompts[1].contains("Requirements: {resume_text}"));
    }

    #[tokio::test]
    async fn test_ats_score_is_parsed_and_clamped() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            "Here you go: {\"score\": 130, \"match_percentage\": 70, \"missing_keywords\": [\"SQL\"], \"feedback\": [], \"improvement_tips\": [\"Add SQL\"]}",
        ]));
        let ai = service(generator);

        let report = ai.calculate_ats_score("resume", "job").await.unwrap();
        assert_eq!(report.score, 100);
        assert_eq!(report.match_percentage, 70);
        assert_eq!(report.missing_keywords, vec!["SQL"]);
        assert!(!report.degraded);
    }

    #[tokio::test]
    async fn test_ats_score_degraded_when_unparseable() {
        let generator = Arc::new(ScriptedGenerator::replying(&["The resume looks good!"]));
        let ai = service(generator);

        let report = ai.calculate_ats_score("resume", "job").await.unwrap();
        assert!(report.degraded);
        assert_eq!(report.score, 0);
    }

    #[tokio::test]
    async fn test_suggest_job_roles_returns_list() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            "[\"Software Engineer\", \"Software Architect\", \" \", 5]",
        ]));
        let ai = service(generator);

        let roles = ai.suggest_job_roles("soft").await.unwrap();
        assert_eq!(roles, vec!["Software Engineer", "Software Architect"]);
    }

    #[tokio::test]
    async fn test_suggest_job_roles_discards_non_list_output() {
        for reply in ["{\"roles\": [\"A\"]}", "no idea", "\"Engineer\""] {
            let generator = Arc::new(ScriptedGenerator::replying(&[reply]));
            let ai = service(generator);
            assert!(ai.suggest_job_roles("eng").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_suggest_job_roles_is_not_retried() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(unavailable())]));
        let ai = service(generator.clone());

        assert!(ai.suggest_job_roles("eng").await.is_err());
        assert_eq!(generator.calls(), 1);
    }
}
