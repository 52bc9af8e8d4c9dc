mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod generation;
mod job_roles;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::generation::queue::{
    requeue_unfinished, spawn_in_process_consumer, spawn_redis_consumer, InProcessQueue, JobQueue,
    RedisQueue,
};
use crate::generation::retry::RetryPolicy;
use crate::generation::service::AiService;
use crate::generation::worker::GenerationWorker;
use crate::job_roles::cache::RoleSuggestionCache;
use crate::job_roles::catalog::{JobRoleCatalog, PgJobRoleCatalog};
use crate::job_roles::seed::seed_if_empty;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

const WEB_POOL_CONNECTIONS: u32 = 10;
const WORKER_POOL_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, WEB_POOL_CONNECTIONS).await?;
    run_migrations(&db).await?;

    // Job role catalog, seeded on first start
    let catalog: Arc<dyn JobRoleCatalog> = Arc::new(PgJobRoleCatalog::new(db.clone()));
    seed_if_empty(catalog.as_ref()).await?;

    // Initialize LLM client and the AI orchestrator
    let llm = LlmClient::from_config(&config).context("Failed to build LLM client")?;
    let ai = AiService::new(llm, RetryPolicy::default());

    // Generation worker runs on its own pool
    let worker_db = create_pool(&config.database_url, WORKER_POOL_CONNECTIONS).await?;
    let worker = GenerationWorker::new(worker_db, ai.clone());

    let queue: Arc<dyn JobQueue> = match &config.redis_url {
        Some(redis_url) => {
            let client = redis::Client::open(redis_url.as_str()).context("Invalid REDIS_URL")?;
            let queue = RedisQueue::connect(&client).await?;
            spawn_redis_consumer(client, worker);
            Arc::new(queue)
        }
        None => {
            let (queue, rx) = InProcessQueue::new();
            spawn_in_process_consumer(rx, worker);
            Arc::new(queue)
        }
    };
    info!("Generation queue: {}", queue.backend());

    if let Err(e) = requeue_unfinished(&db, queue.as_ref()).await {
        warn!("Could not re-enqueue unfinished applications: {e:#}");
    }

    let state = AppState {
        db,
        config: config.clone(),
        ai,
        queue,
        catalog,
        role_cache: Arc::new(RoleSuggestionCache::new()),
    };

    let app = build_router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the configured frontend origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
