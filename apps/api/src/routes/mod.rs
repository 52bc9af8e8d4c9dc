pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::generation::handlers as generation;
use crate::job_roles::handlers as job_roles;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/signup", post(auth::handle_signup))
        .route("/api/v1/auth/login", post(auth::handle_login))
        // Job roles
        .route("/api/v1/job-roles/search", get(job_roles::handle_search))
        .route("/api/v1/job-roles/metadata", get(job_roles::handle_metadata))
        .route("/api/v1/job-roles/select", post(job_roles::handle_select))
        // Resume
        .route("/api/v1/resume/upload", post(resume::handle_upload))
        .route("/api/v1/resume/scratch", post(resume::handle_scratch))
        .route(
            "/api/v1/resume/:id/update-section",
            patch(resume::handle_update_section),
        )
        .route("/api/v1/resume/:id/history", get(resume::handle_history))
        .route("/api/v1/resume/ai-assistant", post(resume::handle_ai_assistant))
        .route("/api/v1/resume/templates", get(resume::handle_templates))
        .route("/api/v1/resume/job", post(resume::handle_submit_job))
        // Generation
        .route("/api/v1/resume/generate", post(generation::handle_generate))
        .route(
            "/api/v1/resume/application/:id",
            get(generation::handle_get_application),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::generation::queue::InProcessQueue;
    use crate::generation::retry::RetryPolicy;
    use crate::generation::service::AiService;
    use crate::job_roles::cache::RoleSuggestionCache;
    use crate::job_roles::memory::MemoryJobRoleCatalog;
    use crate::llm_client::testing::ScriptedGenerator;
    use crate::llm_client::LlmClient;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/tailor_test".to_string(),
            redis_url: None,
            secret_key: "test-secret".to_string(),
            access_token_expire_minutes: 30,
            ai_provider: "ollama".to_string(),
            gemini_api_key: String::new(),
            ollama_host: "http://localhost:11434".to_string(),
            ai_model: "llama3".to_string(),
            ai_timeout_secs: 5,
            upload_dir: "uploads".to_string(),
            max_upload_bytes: 1024 * 1024,
            cors_origins: Vec::new(),
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    /// Router over a lazy pool that never connects; only DB-free routes may be exercised.
    fn test_router(ai_replies: &[&str]) -> Router {
        let config = test_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let (queue, _rx) = InProcessQueue::new();
        let ai = AiService::new(
            LlmClient::new(Arc::new(ScriptedGenerator::replying(ai_replies))),
            RetryPolicy::immediate(1),
        );
        let catalog = MemoryJobRoleCatalog::with_roles(&[
            ("Software Engineer", "Tech", 100),
            ("Software Architect", "Tech", 50),
        ]);
        build_router(AppState {
            db,
            config,
            ai,
            queue: Arc::new(queue),
            catalog: Arc::new(catalog),
            role_cache: Arc::new(RoleSuggestionCache::new()),
        })
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(test_router(&[]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["ai_backend"], "scripted");
        assert_eq!(body["queue"], "in-process");
    }

    #[tokio::test]
    async fn test_templates_catalog_is_public() {
        let (status, body) = get_json(test_router(&[]), "/api/v1/resume/templates").await;
        assert_eq!(status, StatusCode::OK);
        let templates = body.as_array().unwrap();
        assert_eq!(templates.len(), 6);
        assert_eq!(templates[0]["id"], "minimal-pro");
    }

    #[tokio::test]
    async fn test_job_role_search_merges_ai_suggestions() {
        let router = test_router(&["[\"Software Tester\"]"]);
        let (status, body) = get_json(router, "/api/v1/job-roles/search?q=soft").await;
        assert_eq!(status, StatusCode::OK);

        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Software Engineer", "Software Architect", "Software Tester"]);
        assert_eq!(body[2]["category"], "AI Suggested");
    }

    #[tokio::test]
    async fn test_job_role_search_requires_two_characters() {
        let (status, body) = get_json(test_router(&[]), "/api/v1/job-roles/search?q=s").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_job_role_metadata() {
        let (status, body) = get_json(test_router(&[]), "/api/v1/job-roles/metadata").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_roles"], 2);
        assert_eq!(body["categories"][0]["category"], "Tech");
    }

    #[tokio::test]
    async fn test_protected_routes_reject_missing_token() {
        let (status, body) = get_json(test_router(&[]), &format!(
            "/api/v1/resume/application/{}",
            uuid::Uuid::new_v4()
        ))
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_protected_routes_reject_invalid_token() {
        let response = test_router(&[])
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/job-roles/select")
                    .header("authorization", "Bearer not-a-token")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "Astronaut"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
