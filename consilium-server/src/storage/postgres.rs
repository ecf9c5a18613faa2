use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tracing::info;

use super::{
    AnalysisStorage, CASE_SEARCH_LIMIT, CaseLibraryStorage, CmeTopicStorage, Result, StorageError,
};
use crate::models::{
    Analysis, AnalysisFilter, AnalysisUpdate, CaseLibraryEntry, CmeTopic, NewAnalysis,
    NewCaseEntry, NewCmeTopic, SortOrder,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS analyses (
        id BIGSERIAL PRIMARY KEY,
        user_id TEXT NOT NULL,
        patient_id VARCHAR(255) NOT NULL,
        patient_data JSONB NOT NULL,
        debate_history JSONB NOT NULL DEFAULT '[]',
        final_report JSONB,
        differential_diagnoses JSONB NOT NULL DEFAULT '[]',
        selected_specialists JSONB NOT NULL DEFAULT '[]',
        follow_up_history JSONB NOT NULL DEFAULT '[]',
        detected_medications JSONB,
        is_completed BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS analyses_user_created_idx ON analyses (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS analyses_user_patient_idx ON analyses (user_id, patient_id)",
    r#"
    CREATE TABLE IF NOT EXISTS case_library (
        id BIGSERIAL PRIMARY KEY,
        analysis_id BIGINT NOT NULL REFERENCES analyses (id) ON DELETE CASCADE,
        owner_id TEXT NOT NULL,
        tags JSONB NOT NULL DEFAULT '[]',
        final_diagnosis VARCHAR(500) NOT NULL,
        outcome TEXT NOT NULL DEFAULT '',
        is_anonymous BOOLEAN NOT NULL DEFAULT TRUE,
        is_public BOOLEAN NOT NULL DEFAULT FALSE,
        view_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cme_topics (
        id BIGSERIAL PRIMARY KEY,
        user_id TEXT NOT NULL,
        topic VARCHAR(500) NOT NULL,
        relevance TEXT NOT NULL,
        is_completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// PostgreSQL storage. Tables are created on connect.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let storage = Self { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

/// `%term%` with LIKE wildcards in `term` escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl AnalysisStorage for PostgresStorage {
    async fn create_analysis(&self, user_id: &str, new: NewAnalysis) -> Result<Analysis> {
        let analysis = sqlx::query_as::<_, Analysis>(
            r#"
            INSERT INTO analyses (user_id, patient_id, patient_data, debate_history, final_report,
                                  differential_diagnoses, selected_specialists, follow_up_history,
                                  detected_medications, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&new.patient_id)
        .bind(&new.patient_data)
        .bind(Json(&new.debate_history))
        .bind(&new.final_report)
        .bind(Json(&new.differential_diagnoses))
        .bind(Json(&new.selected_specialists))
        .bind(Json(&new.follow_up_history))
        .bind(&new.detected_medications)
        .fetch_one(&self.pool)
        .await?;
        Ok(analysis)
    }

    async fn get_analysis(&self, user_id: &str, id: i64) -> Result<Option<Analysis>> {
        let analysis = sqlx::query_as::<_, Analysis>(
            "SELECT * FROM analyses WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(analysis)
    }

    async fn list_analyses(&self, user_id: &str, filter: &AnalysisFilter) -> Result<Vec<Analysis>> {
        let direction = match filter.order {
            SortOrder::NewestFirst => "DESC",
            SortOrder::OldestFirst => "ASC",
        };
        let sql = format!(
            "SELECT * FROM analyses                                              \
             WHERE user_id = $1                                                  \
               AND ($2::BOOLEAN IS NULL OR is_completed = $2)                    \
               AND ($3::TEXT IS NULL OR patient_id = $3)                         \
               AND ($4::TEXT IS NULL OR patient_data::TEXT ILIKE $4)             \
             ORDER BY created_at {dir}, id {dir}                                 \
             LIMIT $5",
            dir = direction
        );

        let analyses = sqlx::query_as::<_, Analysis>(&sql)
            .bind(user_id)
            .bind(filter.is_completed)
            .bind(filter.patient_id.as_deref())
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.limit.map(|limit| limit as i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(analyses)
    }

    async fn update_analysis(
        &self,
        user_id: &str,
        id: i64,
        update: AnalysisUpdate,
    ) -> Result<Option<Analysis>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Analysis>(
            "SELECT * FROM analyses WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut analysis) = current else {
            return Ok(None);
        };
        update.apply(&mut analysis);

        let saved = sqlx::query_as::<_, Analysis>(
            r#"
            UPDATE analyses
            SET patient_id = $3, patient_data = $4, debate_history = $5, final_report = $6,
                differential_diagnoses = $7, selected_specialists = $8, follow_up_history = $9,
                detected_medications = $10, is_completed = $11, updated_at = $12
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&analysis.patient_id)
        .bind(&analysis.patient_data)
        .bind(Json(&analysis.debate_history))
        .bind(&analysis.final_report)
        .bind(Json(&analysis.differential_diagnoses))
        .bind(Json(&analysis.selected_specialists))
        .bind(Json(&analysis.follow_up_history))
        .bind(&analysis.detected_medications)
        .bind(analysis.is_completed)
        .bind(analysis.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_analysis(&self, user_id: &str, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_analyses(&self, user_id: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl CaseLibraryStorage for PostgresStorage {
    async fn create_case(&self, user_id: &str, new: NewCaseEntry) -> Result<CaseLibraryEntry> {
        let entry = sqlx::query_as::<_, CaseLibraryEntry>(
            r#"
            INSERT INTO case_library (analysis_id, owner_id, tags, final_diagnosis, outcome,
                                      is_anonymous, is_public)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE EXISTS (SELECT 1 FROM analyses WHERE id = $1 AND user_id = $2)
            RETURNING *
            "#,
        )
        .bind(new.analysis_id)
        .bind(user_id)
        .bind(Json(&new.tags))
        .bind(&new.final_diagnosis)
        .bind(&new.outcome)
        .bind(new.is_anonymous)
        .bind(new.is_public)
        .fetch_optional(&self.pool)
        .await?;

        entry.ok_or_else(|| StorageError::NotFound(format!("analysis {}", new.analysis_id)))
    }

    async fn list_cases(&self, user_id: &str) -> Result<Vec<CaseLibraryEntry>> {
        let entries = sqlx::query_as::<_, CaseLibraryEntry>(
            "SELECT * FROM case_library WHERE is_public OR owner_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn get_case(&self, user_id: &str, id: i64) -> Result<Option<CaseLibraryEntry>> {
        let entry = sqlx::query_as::<_, CaseLibraryEntry>(
            "SELECT * FROM case_library WHERE id = $1 AND (is_public OR owner_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn record_case_view(&self, user_id: &str, id: i64) -> Result<Option<i64>> {
        let views: Option<i64> = sqlx::query_scalar(
            "UPDATE case_library SET view_count = view_count + 1 \
             WHERE id = $1 AND (is_public OR owner_id = $2) \
             RETURNING view_count",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(views)
    }

    async fn search_cases(&self, user_id: &str, query: &str) -> Result<Vec<CaseLibraryEntry>> {
        let entries = sqlx::query_as::<_, CaseLibraryEntry>(
            r#"
            SELECT * FROM case_library
            WHERE (is_public OR owner_id = $1)
              AND (tags::TEXT ILIKE $2 OR final_diagnosis ILIKE $2 OR outcome ILIKE $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(like_pattern(query))
        .bind(CASE_SEARCH_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

#[async_trait]
impl CmeTopicStorage for PostgresStorage {
    async fn create_topic(&self, user_id: &str, new: NewCmeTopic) -> Result<CmeTopic> {
        let topic = sqlx::query_as::<_, CmeTopic>(
            "INSERT INTO cme_topics (user_id, topic, relevance, is_completed) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(user_id)
        .bind(&new.topic)
        .bind(&new.relevance)
        .bind(new.is_completed)
        .fetch_one(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn list_topics(&self, user_id: &str) -> Result<Vec<CmeTopic>> {
        let topics = sqlx::query_as::<_, CmeTopic>(
            "SELECT * FROM cme_topics WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(topics)
    }

    async fn complete_topic(&self, user_id: &str, id: i64) -> Result<Option<CmeTopic>> {
        let topic = sqlx::query_as::<_, CmeTopic>(
            "UPDATE cme_topics SET is_completed = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(topic)
    }

    async fn delete_topic(&self, user_id: &str, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cme_topics WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
