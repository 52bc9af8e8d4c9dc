use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::generation::queue::JobQueue;
use crate::generation::service::AiService;
use crate::job_roles::cache::RoleSuggestionCache;
use crate::job_roles::catalog::JobRoleCatalog;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// AI orchestrator. The generation worker holds its own clone.
    pub ai: AiService,
    /// Producer side of the generation queue: in-process channel or Redis list.
    pub queue: Arc<dyn JobQueue>,
    pub catalog: Arc<dyn JobRoleCatalog>,
    pub role_cache: Arc<RoleSuggestionCache>,
}
