//! PostgreSQL storage implementation.
//!
//! Owns the `job_listings` and `job_analysis` tables. Schema is created at
//! store construction with idempotent statements. `job_analysis.job_id`
//! deliberately carries no UNIQUE constraint: the fetch-unanalyzed anti-join
//! is the sole idempotency mechanism, which makes the store safe only under
//! single-writer enrichment runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::store::{AnalysisStore, ListingStore};
use crate::types::analysis::JobAnalysis;
use crate::types::listing::{RawListing, StoredListing};

/// PostgreSQL-backed listing and analysis store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and prepare the schema.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.url())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string().into()))?;

        Self::from_pool(pool).await
    }

    /// Create from an existing connection pool.
    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_listings (
                id BIGSERIAL PRIMARY KEY,
                title VARCHAR(255) NOT NULL,
                description VARCHAR(2000) NOT NULL,
                company_name VARCHAR(255) NOT NULL,
                location VARCHAR(255) NOT NULL,
                sector VARCHAR(255) NOT NULL,
                remote_type VARCHAR(100) NOT NULL,
                scraped_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        // No UNIQUE on job_id: single-writer enrichment relies on the
        // anti-join below instead.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_analysis (
                job_id BIGINT NOT NULL REFERENCES job_listings(id),
                hard_skills JSONB,
                soft_skills JSONB,
                location TEXT,
                sector TEXT,
                responsibilities JSONB,
                work_type TEXT,
                scraped_at TIMESTAMPTZ,
                title_skills JSONB
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(query_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_analysis_job_id ON job_analysis(job_id)")
            .execute(&self.pool)
            .await
            .ok();

        Ok(())
    }

    // =========================================================================
    // Read-side aggregates consumed by the dashboard
    // =========================================================================

    /// Months with at least one analysis row, newest first.
    #[instrument(skip(self))]
    pub async fn distinct_months(&self) -> StoreResult<Vec<DateTime<Utc>>> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT DISTINCT DATE_TRUNC('month', scraped_at) AS month FROM job_analysis ORDER BY month DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        Ok(rows.into_iter().map(|(month,)| month).collect())
    }

    /// All analysis rows for one month.
    #[instrument(skip(self))]
    pub async fn analyses_for_month(&self, month: DateTime<Utc>) -> StoreResult<Vec<MonthlyAnalysis>> {
        let rows = sqlx::query_as::<_, MonthlyAnalysisRow>(
            r#"
            SELECT sector, work_type, location, hard_skills, soft_skills,
                   responsibilities, title_skills, scraped_at
            FROM job_analysis
            WHERE DATE_TRUNC('month', scraped_at) = $1
            "#,
        )
        .bind(month)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        debug!(count = rows.len(), "monthly analyses fetched");
        rows.into_iter().map(|r| r.into_monthly()).collect()
    }

    /// Per-skill counts for one skill field in one month, most common first.
    #[instrument(skip(self))]
    pub async fn skill_distribution(
        &self,
        field: SkillField,
        month: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<(String, i64)>> {
        // Column name comes from the enum, never from caller input.
        let query = format!(
            r#"
            SELECT skill, COUNT(*) AS count
            FROM (
                SELECT jsonb_array_elements_text({}) AS skill
                FROM job_analysis
                WHERE DATE_TRUNC('month', scraped_at) = $1
            ) skills
            GROUP BY skill
            ORDER BY count DESC
            LIMIT $2
            "#,
            field.column()
        );

        sqlx::query_as::<_, (String, i64)>(&query)
            .bind(month)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(query_err)
    }

    /// Sector frequency ranking for one month.
    #[instrument(skip(self))]
    pub async fn top_sectors(
        &self,
        month: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<(String, i64)>> {
        sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT sector, COUNT(*) AS job_count
            FROM job_analysis
            WHERE DATE_TRUNC('month', scraped_at) = $1
            GROUP BY sector
            ORDER BY job_count DESC
            LIMIT $2
            "#,
        )
        .bind(month)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)
    }
}

#[async_trait]
impl ListingStore for PostgresStore {
    #[instrument(skip(self, listing), fields(title = %listing.title))]
    async fn insert(&self, listing: RawListing) -> StoreResult<i64> {
        let capped = listing.capped();

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO job_listings
                (title, description, company_name, location, sector, remote_type, scraped_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id
            "#,
        )
        .bind(&capped.title)
        .bind(&capped.description)
        .bind(&capped.company_name)
        .bind(&capped.location)
        .bind(&capped.sector)
        .bind(&capped.remote_type)
        .fetch_one(&self.pool)
        .await
        .map_err(query_err)?;

        debug!(id, "listing inserted");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn fetch_unanalyzed(&self, limit: usize) -> StoreResult<Vec<StoredListing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, title, description, company_name, location, sector,
                   remote_type, scraped_at
            FROM job_listings
            WHERE NOT EXISTS (
                SELECT 1 FROM job_analysis WHERE job_id = job_listings.id
            )
            ORDER BY scraped_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        info!(count = rows.len(), "unanalyzed listings fetched");
        Ok(rows.into_iter().map(ListingRow::into_listing).collect())
    }
}

#[async_trait]
impl AnalysisStore for PostgresStore {
    #[instrument(skip(self, analysis))]
    async fn save(
        &self,
        job_id: i64,
        analysis: &JobAnalysis,
        scraped_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(query_err)?;

        let result = sqlx::query(
            r#"
            INSERT INTO job_analysis
                (job_id, hard_skills, soft_skills, location, sector,
                 responsibilities, work_type, scraped_at, title_skills)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(job_id)
        .bind(serde_json::json!(analysis.hard_skills))
        .bind(serde_json::json!(analysis.soft_skills))
        .bind(&analysis.location)
        .bind(&analysis.sector)
        .bind(serde_json::json!(analysis.responsibilities))
        .bind(analysis.work_type.as_str())
        .bind(scraped_at)
        .bind(serde_json::json!(analysis.title_skills))
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {
                tx.commit().await.map_err(query_err)?;
                info!(job_id, "analysis saved");
                Ok(())
            }
            Err(e) => {
                tx.rollback().await.ok();
                Err(query_err(e))
            }
        }
    }

    async fn analysis_count(&self) -> StoreResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM job_analysis")
            .fetch_one(&self.pool)
            .await
            .map_err(query_err)?;

        Ok(count as usize)
    }
}

/// Skill columns the dashboard expands with `jsonb_array_elements_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillField {
    Hard,
    Soft,
    Responsibilities,
    Title,
}

impl SkillField {
    fn column(self) -> &'static str {
        match self {
            Self::Hard => "hard_skills",
            Self::Soft => "soft_skills",
            Self::Responsibilities => "responsibilities",
            Self::Title => "title_skills",
        }
    }
}

/// One `job_analysis` row as the dashboard consumes it.
#[derive(Debug, Clone)]
pub struct MonthlyAnalysis {
    pub sector: Option<String>,
    pub work_type: Option<String>,
    pub location: Option<String>,
    pub hard_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub responsibilities: Vec<String>,
    pub title_skills: Vec<String>,
    pub scraped_at: Option<DateTime<Utc>>,
}

// Row types

#[derive(Debug, FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    description: String,
    company_name: String,
    location: String,
    sector: String,
    remote_type: String,
    scraped_at: DateTime<Utc>,
}

impl ListingRow {
    fn into_listing(self) -> StoredListing {
        StoredListing {
            id: self.id,
            title: self.title,
            description: self.description,
            company_name: self.company_name,
            location: self.location,
            sector: self.sector,
            remote_type: self.remote_type,
            scraped_at: self.scraped_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MonthlyAnalysisRow {
    sector: Option<String>,
    work_type: Option<String>,
    location: Option<String>,
    hard_skills: Option<serde_json::Value>,
    soft_skills: Option<serde_json::Value>,
    responsibilities: Option<serde_json::Value>,
    title_skills: Option<serde_json::Value>,
    scraped_at: Option<DateTime<Utc>>,
}

impl MonthlyAnalysisRow {
    fn into_monthly(self) -> StoreResult<MonthlyAnalysis> {
        Ok(MonthlyAnalysis {
            sector: self.sector,
            work_type: self.work_type,
            location: self.location,
            hard_skills: decode_skills(self.hard_skills)?,
            soft_skills: decode_skills(self.soft_skills)?,
            responsibilities: decode_skills(self.responsibilities)?,
            title_skills: decode_skills(self.title_skills)?,
            scraped_at: self.scraped_at,
        })
    }
}

/// Skill columns are JSON arrays of strings or null.
fn decode_skills(value: Option<serde_json::Value>) -> StoreResult<Vec<String>> {
    match value {
        None => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StoreError::Decode(format!("invalid skill array: {e}"))),
    }
}

fn query_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string().into())
        }
        other => StoreError::Query(other.to_string().into()),
    }
}
