//! Autocomplete: catalog prefix search topped up with AI suggestions.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::cache::RoleSuggestionCache;
use super::catalog::{CategoryCount, JobRoleCatalog};
use crate::errors::AppError;
use crate::generation::service::AiService;
use crate::models::job_role::{JobRoleRow, JobRoleSuggestion};

pub const MAX_RESULTS: usize = 10;
/// Below this many catalog hits, AI suggestions are appended.
pub const AI_TOP_UP_THRESHOLD: usize = 5;
pub const MIN_QUERY_CHARS: usize = 2;
pub const AI_SUGGESTED_CATEGORY: &str = "AI Suggested";

/// Levels offered by the resume builder's setup step.
pub const EXPERIENCE_LEVELS: [&str; 6] = ["Intern", "Junior", "Mid-Level", "Senior", "Lead", "Executive"];

#[derive(Debug, Serialize)]
pub struct JobRoleMetadata {
    pub categories: Vec<CategoryCount>,
    pub total_roles: i64,
    pub experience_levels: Vec<&'static str>,
}

pub async fn search_roles(
    catalog: &dyn JobRoleCatalog,
    ai: &AiService,
    cache: &RoleSuggestionCache,
    query: &str,
) -> Result<Vec<JobRoleSuggestion>, AppError> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(AppError::Validation(format!(
            "Query must be at least {MIN_QUERY_CHARS} characters"
        )));
    }

    let rows = catalog.search_prefix(query, MAX_RESULTS as i64).await?;
    if rows.len() >= AI_TOP_UP_THRESHOLD {
        return Ok(rows.into_iter().map(JobRoleSuggestion::from).collect());
    }

    let suggestions = match cache.get(query).await {
        Some(cached) => {
            debug!("Role suggestions for '{query}' served from cache");
            cached
        }
        None => match ai.suggest_job_roles(query).await {
            Ok(fresh) => {
                cache.insert(query, fresh.clone()).await;
                fresh
            }
            Err(e) => {
                warn!("AI role suggestions failed for '{query}', returning catalog matches only: {e}");
                Vec::new()
            }
        },
    };

    Ok(merge_suggestions(rows, suggestions))
}

/// Catalog rows first, then unseen suggestions (case-insensitive), capped at `MAX_RESULTS`.
pub fn merge_suggestions(rows: Vec<JobRoleRow>, suggestions: Vec<String>) -> Vec<JobRoleSuggestion> {
    let mut seen: HashSet<String> = rows.iter().map(|r| r.name.to_lowercase()).collect();
    let mut merged: Vec<JobRoleSuggestion> = rows.into_iter().map(JobRoleSuggestion::from).collect();

    for name in suggestions {
        if merged.len() >= MAX_RESULTS {
            break;
        }
        if seen.insert(name.to_lowercase()) {
            merged.push(JobRoleSuggestion {
                id: None,
                name,
                category: AI_SUGGESTED_CATEGORY.to_string(),
            });
        }
    }
    merged
}

pub async fn metadata(catalog: &dyn JobRoleCatalog) -> Result<JobRoleMetadata, AppError> {
    Ok(JobRoleMetadata {
        categories: catalog.category_counts().await?,
        total_roles: catalog.count().await?,
        experience_levels: EXPERIENCE_LEVELS.to_vec(),
    })
}

/// Records that a user picked `name`, creating the role if it is new.
pub async fn select_role(catalog: &dyn JobRoleCatalog, name: &str) -> Result<JobRoleRow, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Role name cannot be empty".to_string()));
    }
    Ok(catalog.record_selection(name).await?)
}
