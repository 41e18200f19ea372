// SQLite metric store. Insert-only for the aggregators; reads exist for tooling and tests.
// JSON-shaped fields (query, request, content_length, error, resolvers) are stored as JSON text.

use crate::models::{NetworkMetric, RequestMetric};
use crate::sqlite::open_pool;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use tracing::instrument;

pub struct MetricRepo {
    pool: SqlitePool,
}

impl MetricRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        let pool = open_pool(path, max_pool_size).await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS request_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT NOT NULL,
                node_id TEXT,
                latency INTEGER,
                query TEXT NOT NULL,
                user_agent TEXT,
                ip TEXT,
                request TEXT NOT NULL,
                raw_response_body TEXT,
                content_length TEXT,
                error TEXT,
                request_date INTEGER,
                response_date INTEGER,
                resolvers TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_request_metrics_request_id ON request_metrics(request_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_request_metrics_request_date ON request_metrics(request_date)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS network_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                node_id TEXT NOT NULL,
                date INTEGER NOT NULL,
                bytes_in INTEGER NOT NULL,
                bytes_out INTEGER NOT NULL,
                connections INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_network_metrics_node_date ON network_metrics(node_id, date)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, metric), fields(repo = "metric", operation = "insert_request_metric", request_id = %metric.request_id))]
    pub async fn insert_request_metric(&self, metric: &RequestMetric) -> anyhow::Result<()> {
        let resolvers = serde_json::to_string(&metric.resolvers)?;
        let query = serde_json::to_string(&metric.query)?;
        let request = serde_json::to_string(&metric.request)?;
        let content_length = metric
            .content_length
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let error = metric
            .error
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO request_metrics
            (request_id, node_id, latency, query, user_agent, ip, request,
             raw_response_body, content_length, error, request_date, response_date, resolvers)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&metric.request_id)
        .bind(&metric.node_id)
        .bind(metric.latency)
        .bind(&query)
        .bind(&metric.user_agent)
        .bind(&metric.ip)
        .bind(&request)
        .bind(&metric.raw_response_body)
        .bind(&content_length)
        .bind(&error)
        .bind(metric.request_date)
        .bind(metric.response_date)
        .bind(&resolvers)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self, metric), fields(repo = "metric", operation = "insert_network_metric", node_id = %metric.node_id))]
    pub async fn insert_network_metric(&self, metric: &NetworkMetric) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO network_metrics (node_id, date, bytes_in, bytes_out, connections) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&metric.node_id)
        .bind(metric.date)
        .bind(metric.bytes_in)
        .bind(metric.bytes_out)
        .bind(metric.connections)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All metrics stored for `request_id`, in insertion order.
    pub async fn get_request_metrics(&self, request_id: &str) -> anyhow::Result<Vec<RequestMetric>> {
        let rows = sqlx::query(
            "SELECT request_id, node_id, latency, query, user_agent, ip, request,
                    raw_response_body, content_length, error, request_date, response_date, resolvers
             FROM request_metrics WHERE request_id = $1 ORDER BY id ASC",
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_request_row(&row)?);
        }
        Ok(out)
    }

    pub async fn count_request_metrics(&self) -> anyhow::Result<u64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM request_metrics")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as u64)
    }

    /// Network metrics for `node_id`, ascending by date.
    pub async fn get_network_metrics(&self, node_id: &str) -> anyhow::Result<Vec<NetworkMetric>> {
        let rows = sqlx::query(
            "SELECT node_id, date, bytes_in, bytes_out, connections
             FROM network_metrics WHERE node_id = $1 ORDER BY date ASC, id ASC",
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(NetworkMetric {
                node_id: row.try_get("node_id")?,
                date: row.try_get("date")?,
                bytes_in: row.try_get("bytes_in")?,
                bytes_out: row.try_get("bytes_out")?,
                connections: row.try_get("connections")?,
            });
        }
        Ok(out)
    }

    fn parse_request_row(row: &SqliteRow) -> anyhow::Result<RequestMetric> {
        let query: String = row.try_get("query")?;
        let request: String = row.try_get("request")?;
        let content_length: Option<String> = row.try_get("content_length")?;
        let error: Option<String> = row.try_get("error")?;
        let resolvers: String = row.try_get("resolvers")?;

        Ok(RequestMetric {
            request_id: row.try_get("request_id")?,
            resolvers: serde_json::from_str(&resolvers)?,
            latency: row.try_get("latency")?,
            node_id: row.try_get("node_id")?,
            query: serde_json::from_str(&query)?,
            user_agent: row.try_get("user_agent")?,
            ip: row.try_get("ip")?,
            request: serde_json::from_str(&request)?,
            raw_response_body: row.try_get("raw_response_body")?,
            content_length: content_length
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            error: error.as_deref().map(serde_json::from_str).transpose()?,
            request_date: row.try_get("request_date")?,
            response_date: row.try_get("response_date")?,
        })
    }
}
