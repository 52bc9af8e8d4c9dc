use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobRoleRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub popularity: i32,
    pub created_at: DateTime<Utc>,
}

/// One autocomplete result. AI suggestions that are not in the catalog have no id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRoleSuggestion {
    pub id: Option<Uuid>,
    pub name: String,
    pub category: String,
}

impl From<JobRoleRow> for JobRoleSuggestion {
    fn from(row: JobRoleRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.name,
            category: row.category,
        }
    }
}
