//! Append-only analysis history.
//!
//! One table, no updates, no deletes. Records are retrieved newest-first by
//! creation time; ties (same-second inserts) fall back to the rowid so
//! insertion order still wins.

use crate::core::errors::{HistoryError, HistoryResult};
use crate::core::types::AnalysisResult;
use chrono::Utc;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// A persisted, immutable snapshot of one analysis outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub timestamp: String,
    pub filename: String,
    pub analysis_type: String,
    pub species: String,
    pub quality_grade: String,
    pub quality_score: f64,
    pub weight: f64,
    pub market_value: f64,
    pub full_results: serde_json::Value,
    pub created_at: String,
}

/// Column values for one insert. Built by the pipeline/batch callers.
#[derive(Debug)]
pub struct NewHistoryRecord<'a> {
    pub filename: &'a str,
    pub analysis_type: &'a str,
    pub species: &'a str,
    pub quality_grade: &'a str,
    pub quality_score: f64,
    pub weight: f64,
    pub market_value: f64,
    pub full_results: serde_json::Value,
}

impl<'a> NewHistoryRecord<'a> {
    /// Snapshot a full single-image analysis result.
    pub fn from_analysis(
        result: &'a AnalysisResult,
        filename: &'a str,
        analysis_type: &'a str,
    ) -> HistoryResult<Self> {
        Ok(Self {
            filename,
            analysis_type,
            species: &result.species.name,
            quality_grade: result.quality.grade.as_str(),
            quality_score: result.quality.score,
            weight: result.size.weight_kg,
            market_value: result.market.total_value,
            full_results: serde_json::to_value(result)?,
        })
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Open (or create) the history database at `database_path`.
    pub async fn open(database_path: &str) -> HistoryResult<Self> {
        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", database_path);
        debug!("Connecting to history database: {}", db_url);

        let pool = SqlitePool::connect(&db_url).await?;
        init_tables(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. Pinned to a single connection because
    /// every new `:memory:` connection would see its own empty database.
    pub async fn open_in_memory() -> HistoryResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        init_tables(&pool).await?;
        Ok(Self { pool })
    }

    /// Persist one record. Returns the new record id.
    pub async fn append(&self, record: NewHistoryRecord<'_>) -> HistoryResult<i64> {
        let timestamp = Utc::now().to_rfc3339();
        let full_results = record.full_results.to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO analysis_history (
                timestamp, filename, analysis_type, species,
                quality_grade, quality_score, weight, market_value, full_results
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&timestamp)
        .bind(record.filename)
        .bind(record.analysis_type)
        .bind(record.species)
        .bind(record.quality_grade)
        .bind(record.quality_score)
        .bind(record.weight)
        .bind(record.market_value)
        .bind(&full_results)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fire-and-forget persistence: failures are logged and swallowed.
    ///
    /// This is a documented contract, not a silent catch: by the time the
    /// append runs, the analysis has already succeeded and been returned to
    /// the caller, so a storage failure must not fail that request. Callers
    /// that need confirmation use `append` directly.
    pub async fn append_best_effort(&self, record: NewHistoryRecord<'_>) -> bool {
        match self.append(record).await {
            Ok(id) => {
                debug!("History record {} saved", id);
                true
            }
            Err(e) => {
                warn!("History append failed (analysis already delivered): {}", e);
                false
            }
        }
    }

    /// Page through records, newest first.
    ///
    /// Read failures surface to the caller, unlike append failures.
    pub async fn list(&self, limit: i64, offset: i64) -> HistoryResult<Vec<HistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, filename, analysis_type, species,
                   quality_grade, quality_score, weight, market_value,
                   full_results, created_at
            FROM analysis_history
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let full_results: String = row.get("full_results");
            let full_results =
                serde_json::from_str(&full_results).unwrap_or(serde_json::Value::Null);

            records.push(HistoryRecord {
                id: row.get("id"),
                timestamp: row.get("timestamp"),
                filename: row.get("filename"),
                analysis_type: row.get("analysis_type"),
                species: row.get("species"),
                quality_grade: row.get("quality_grade"),
                quality_score: row.get("quality_score"),
                weight: row.get("weight"),
                market_value: row.get("market_value"),
                full_results,
                created_at: row.get("created_at"),
            });
        }

        Ok(records)
    }
}

async fn init_tables(pool: &SqlitePool) -> Result<(), HistoryError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            filename TEXT,
            analysis_type TEXT,
            species TEXT,
            quality_grade TEXT,
            quality_score REAL,
            weight REAL,
            market_value REAL,
            full_results TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    debug!("History table initialized (analysis_history)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(species: &str, value: f64) -> NewHistoryRecord<'_> {
        NewHistoryRecord {
            filename: "test.jpg",
            analysis_type: "single",
            species,
            quality_grade: "Premium",
            quality_score: 90.0,
            weight: 1.2,
            market_value: value,
            full_results: serde_json::json!({ "species": species }),
        }
    }

    #[tokio::test]
    async fn test_append_then_list_newest_first() {
        let store = HistoryStore::open_in_memory().await.unwrap();

        for i in 0..3 {
            store.append(record("Trout", 10.0 + i as f64)).await.unwrap();
        }

        let records = store.list(DEFAULT_LIST_LIMIT, 0).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].market_value, 12.0);
        assert_eq!(records[2].market_value, 10.0);
    }

    #[tokio::test]
    async fn test_pagination_returns_second_newest() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        store.append(record("Trout", 1.0)).await.unwrap();
        store.append(record("Shrimp", 2.0)).await.unwrap();
        store.append(record("Sea Bass", 3.0)).await.unwrap();

        let page = store.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].species, "Shrimp");
    }

    #[tokio::test]
    async fn test_full_results_round_trip() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        let id = store.append(record("Red Mullet", 22.0)).await.unwrap();
        assert!(id > 0);

        let records = store.list(10, 0).await.unwrap();
        assert_eq!(records[0].full_results["species"], "Red Mullet");
        assert_eq!(records[0].analysis_type, "single");
    }

    #[tokio::test]
    async fn test_limit_caps_page_size() {
        let store = HistoryStore::open_in_memory().await.unwrap();
        for _ in 0..5 {
            store.append(record("Trout", 16.0)).await.unwrap();
        }
        assert_eq!(store.list(2, 0).await.unwrap().len(), 2);
        assert_eq!(store.list(50, 0).await.unwrap().len(), 5);
    }
}
