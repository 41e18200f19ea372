// SQLite-backed event queue: append-only, per-key ordered lists of serialized payloads.
// Order within a key is insertion order (rowid). Consumers remove from the front only.

use crate::sqlite::{now_ms, open_pool};
use sqlx::sqlite::SqlitePool;
use tracing::instrument;

pub struct QueueRepo {
    pool: SqlitePool,
}

impl QueueRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        let pool = open_pool(path, max_pool_size).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                enqueued_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_key_id ON queue_entries(key, id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Appends `value` to the back of the list at `key`.
    #[instrument(skip(self, value), fields(repo = "queue", operation = "push"))]
    pub async fn push(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO queue_entries (key, value, enqueued_at) VALUES ($1, $2, $3)")
            .bind(key)
            .bind(value)
            .bind(now_ms())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn len(&self, key: &str) -> anyhow::Result<usize> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM queue_entries WHERE key = $1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }

    /// Up to `limit` values from the front of `key`, oldest first. `None` reads the whole list.
    #[instrument(skip(self), fields(repo = "queue", operation = "range"))]
    pub async fn range(&self, key: &str, limit: Option<usize>) -> anyhow::Result<Vec<String>> {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT value FROM queue_entries WHERE key = $1 ORDER BY id ASC LIMIT $2",
        )
        .bind(key)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }

    /// Removes exactly the first `count` entries of `key`. Entries behind them are kept.
    #[instrument(skip(self), fields(repo = "queue", operation = "trim_front"))]
    pub async fn trim_front(&self, key: &str, count: usize) -> anyhow::Result<u64> {
        if count == 0 {
            return Ok(0);
        }
        let r = sqlx::query(
            "DELETE FROM queue_entries WHERE id IN
                (SELECT id FROM queue_entries WHERE key = $1 ORDER BY id ASC LIMIT $2)",
        )
        .bind(key)
        .bind(sql_limit(Some(count)))
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }

    /// Reads up to `limit` entries from the front of `key` and removes exactly those entries
    /// in a single statement. Values appended concurrently stay queued for the next reader.
    #[instrument(skip(self), fields(repo = "queue", operation = "take_front"))]
    pub async fn take_front(&self, key: &str, limit: Option<usize>) -> anyhow::Result<Vec<String>> {
        let mut rows = sqlx::query_as::<_, (i64, String)>(
            "DELETE FROM queue_entries WHERE id IN
                (SELECT id FROM queue_entries WHERE key = $1 ORDER BY id ASC LIMIT $2)
             RETURNING id, value",
        )
        .bind(key)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        // RETURNING order is unspecified
        rows.sort_unstable_by_key(|(id, _)| *id);
        Ok(rows.into_iter().map(|(_, value)| value).collect())
    }
}

/// SQLite treats a negative LIMIT as unbounded.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}
