//! Storage seam for the job role catalog. Postgres in production, an in-memory
//! map in tests.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::job_role::JobRoleRow;

/// Category name created for roles that users type in themselves.
pub const USER_ADDED_CATEGORY: &str = "User Added";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// One role to insert when seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRole {
    pub name: String,
    pub category: &'static str,
    pub popularity: i32,
}

#[async_trait]
pub trait JobRoleCatalog: Send + Sync {
    /// Case-insensitive prefix match, most popular first, ties by name.
    async fn search_prefix(&self, prefix: &str, limit: i64) -> Result<Vec<JobRoleRow>, sqlx::Error>;

    /// Bumps popularity of an existing role (matched case-insensitively) by one,
    /// or creates it with popularity 1 under "User Added".
    async fn record_selection(&self, name: &str) -> Result<JobRoleRow, sqlx::Error>;

    /// Role counts per category, largest first.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>, sqlx::Error>;

    async fn count(&self) -> Result<i64, sqlx::Error>;

    /// Inserts roles, skipping names already present. Returns rows inserted.
    async fn insert_many(&self, roles: &[SeedRole]) -> Result<u64, sqlx::Error>;
}

pub struct PgJobRoleCatalog {
    pool: PgPool,
}

impl PgJobRoleCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRoleCatalog for PgJobRoleCatalog {
    async fn search_prefix(&self, prefix: &str, limit: i64) -> Result<Vec<JobRoleRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRoleRow>(
            r#"
            SELECT * FROM job_roles
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY popularity DESC, name ASC
            LIMIT $2
            "#,
        )
        .bind(format!("{}%", escape_like(prefix)))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn record_selection(&self, name: &str) -> Result<JobRoleRow, sqlx::Error> {
        sqlx::query_as::<_, JobRoleRow>(
            r#"
            INSERT INTO job_roles (id, name, category, popularity)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT ((LOWER(name))) DO UPDATE
            SET popularity = job_roles.popularity + 1
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(USER_ADDED_CATEGORY)
        .fetch_one(&self.pool)
        .await
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM job_roles
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_roles")
            .fetch_one(&self.pool)
            .await
    }

    async fn insert_many(&self, roles: &[SeedRole]) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for role in roles {
            let result = sqlx::query(
                r#"
                INSERT INTO job_roles (id, name, category, popularity)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT ((LOWER(name))) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&role.name)
            .bind(role.category)
            .bind(role.popularity)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }
}

/// Escapes LIKE metacharacters so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
