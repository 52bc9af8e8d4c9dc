//! In-memory `JobRoleCatalog` for tests that should not need Postgres.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::catalog::{CategoryCount, JobRoleCatalog, SeedRole, USER_ADDED_CATEGORY};
use crate::models::job_role::JobRoleRow;

/// Keyed by lower-cased name, mirroring the unique index on `LOWER(name)`.
#[derive(Default)]
pub struct MemoryJobRoleCatalog {
    roles: RwLock<BTreeMap<String, JobRoleRow>>,
}

impl MemoryJobRoleCatalog {
    pub fn with_roles(roles: &[(&str, &str, i32)]) -> Self {
        let map = roles
            .iter()
            .map(|(name, category, popularity)| {
                (name.to_lowercase(), row(name, category, *popularity))
            })
            .collect();
        Self {
            roles: RwLock::new(map),
        }
    }

    pub async fn get(&self, name: &str) -> Option<JobRoleRow> {
        self.roles.read().await.get(&name.to_lowercase()).cloned()
    }
}

fn row(name: &str, category: &str, popularity: i32) -> JobRoleRow {
    JobRoleRow {
        id: Uuid::new_v4(),
        name: name.to_string(),
        category: category.to_string(),
        popularity,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl JobRoleCatalog for MemoryJobRoleCatalog {
    async fn search_prefix(&self, prefix: &str, limit: i64) -> Result<Vec<JobRoleRow>, sqlx::Error> {
        let prefix = prefix.to_lowercase();
        let mut hits: Vec<JobRoleRow> = self
            .roles
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, role)| role.clone())
            .collect();
        hits.sort_by(|a, b| b.popularity.cmp(&a.popularity).then_with(|| a.name.cmp(&b.name)));
        hits.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(hits)
    }

    async fn record_selection(&self, name: &str) -> Result<JobRoleRow, sqlx::Error> {
        let mut roles = self.roles.write().await;
        let entry = roles
            .entry(name.to_lowercase())
            .and_modify(|role| role.popularity += 1)
            .or_insert_with(|| row(name, USER_ADDED_CATEGORY, 1));
        Ok(entry.clone())
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, sqlx::Error> {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for role in self.roles.read().await.values() {
            *counts.entry(role.category.clone()).or_default() += 1;
        }
        let mut counts: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(counts)
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.roles.read().await.len() as i64)
    }

    async fn insert_many(&self, seed: &[SeedRole]) -> Result<u64, sqlx::Error> {
        let mut roles = self.roles.write().await;
        let mut inserted = 0;
        for role in seed {
            let key = role.name.to_lowercase();
            if !roles.contains_key(&key) {
                roles.insert(key, row(&role.name, role.category, role.popularity));
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
