//! Read-side rollups over the pipeline's output, fronted by a short-lived
//! in-memory cache. Absence of the cache affects latency only, never
//! correctness.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;

use veracity_common::Verdict;

const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Day,
    Week,
    Month,
}

impl TimeRange {
    pub fn hours(&self) -> i64 {
        match self {
            TimeRange::Day => 24,
            TimeRange::Week => 7 * 24,
            TimeRange::Month => 30 * 24,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_articles: i64,
    pub total_claims: i64,
    pub total_investigations: i64,
    pub last_ingestion: Option<DateTime<Utc>>,
    /// Verdict label -> completed investigation count, all six buckets
    /// present even when zero.
    pub verdict_distribution: HashMap<String, i64>,
    pub recent: RecentActivity,
    pub quality: QualityMetrics,
    pub queue: QueueStatus,
    pub top_techniques: Vec<TechniqueCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub time_range: &'static str,
    pub new_articles: i64,
    pub new_claims: i64,
    pub new_investigations: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityMetrics {
    pub avg_confidence: f64,
    pub avg_source_reliability: f64,
    pub avg_propaganda_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub pending_articles: i64,
    pub processing_articles: i64,
    pub pending_claims: i64,
    pub checking_claims: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechniqueCount {
    pub technique: String,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// StatsReader
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct StatsReader {
    pool: PgPool,
}

impl StatsReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn dashboard(&self, range: TimeRange) -> Result<DashboardStats> {
        let totals = sqlx::query(
            r#"
            SELECT
                (SELECT count(*) FROM articles)       AS total_articles,
                (SELECT count(*) FROM claims)         AS total_claims,
                (SELECT count(*) FROM investigations) AS total_investigations,
                (SELECT max(created_at) FROM articles) AS last_ingestion
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_articles: totals.get("total_articles"),
            total_claims: totals.get("total_claims"),
            total_investigations: totals.get("total_investigations"),
            last_ingestion: totals.get("last_ingestion"),
            verdict_distribution: self.verdict_distribution().await?,
            recent: self.recent_activity(range).await?,
            quality: self.quality_metrics().await?,
            queue: self.queue_status().await?,
            top_techniques: self.top_techniques(5).await?,
        })
    }

    async fn verdict_distribution(&self) -> Result<HashMap<String, i64>> {
        let rows = sqlx::query(
            "SELECT verdict, count(*) AS n FROM investigations GROUP BY verdict",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut distribution: HashMap<String, i64> = Verdict::ALL
            .iter()
            .map(|v| (v.as_str().to_string(), 0))
            .collect();
        for row in rows {
            let verdict: String = row.get("verdict");
            let n: i64 = row.get("n");
            // Unknown labels are folded into unverifiable rather than dropped.
            let key = Verdict::parse_lenient(&verdict).as_str().to_string();
            *distribution.entry(key).or_insert(0) += n;
        }
        Ok(distribution)
    }

    async fn recent_activity(&self, range: TimeRange) -> Result<RecentActivity> {
        let cutoff = Utc::now() - chrono::Duration::hours(range.hours());
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT count(*) FROM articles WHERE created_at >= $1)       AS new_articles,
                (SELECT count(*) FROM claims WHERE created_at >= $1)         AS new_claims,
                (SELECT count(*) FROM investigations WHERE created_at >= $1) AS new_investigations
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(RecentActivity {
            time_range: range.label(),
            new_articles: row.get("new_articles"),
            new_claims: row.get("new_claims"),
            new_investigations: row.get("new_investigations"),
        })
    }

    async fn quality_metrics(&self) -> Result<QualityMetrics> {
        let row = sqlx::query(
            r#"
            SELECT
                coalesce(avg(confidence), 0)             AS avg_confidence,
                coalesce(avg(source_reliability_avg), 0) AS avg_source_reliability,
                coalesce(avg(least(
                    (propaganda_signals->>'overall_score')::double precision, 1.0
                )), 0)                                   AS avg_propaganda_score
            FROM investigations
            WHERE status = 'completed'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QualityMetrics {
            avg_confidence: row.get("avg_confidence"),
            avg_source_reliability: row.get("avg_source_reliability"),
            avg_propaganda_score: row.get("avg_propaganda_score"),
        })
    }

    async fn queue_status(&self) -> Result<QueueStatus> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT count(*) FROM articles WHERE status = 'pending')    AS pending_articles,
                (SELECT count(*) FROM articles WHERE status = 'processing') AS processing_articles,
                (SELECT count(*) FROM claims WHERE status = 'pending')      AS pending_claims,
                (SELECT count(*) FROM claims WHERE status = 'checking')     AS checking_claims
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueStatus {
            pending_articles: row.get("pending_articles"),
            processing_articles: row.get("processing_articles"),
            pending_claims: row.get("pending_claims"),
            checking_claims: row.get("checking_claims"),
        })
    }

    async fn top_techniques(&self, limit: i64) -> Result<Vec<TechniqueCount>> {
        let rows = sqlx::query(
            r#"
            SELECT t->>'technique' AS technique, count(*) AS n
            FROM investigations,
                 jsonb_array_elements(propaganda_signals->'techniques') AS t
            GROUP BY t->>'technique'
            ORDER BY n DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TechniqueCount {
                technique: r.get("technique"),
                count: r.get("n"),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// CachedStats — read-through cache keyed by time range
// ---------------------------------------------------------------------------

pub struct CachedStats {
    reader: StatsReader,
    ttl: Duration,
    cache: RwLock<HashMap<TimeRange, (Instant, DashboardStats)>>,
}

impl CachedStats {
    pub fn new(reader: StatsReader) -> Self {
        Self {
            reader,
            ttl: CACHE_TTL,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn dashboard(&self, range: TimeRange) -> Result<DashboardStats> {
        {
            let cache = self.cache.read().await;
            if let Some((loaded_at, stats)) = cache.get(&range) {
                if loaded_at.elapsed() < self.ttl {
                    return Ok(stats.clone());
                }
            }
        }

        let stats = self.reader.dashboard(range).await?;
        self.cache
            .write()
            .await
            .insert(range, (Instant::now(), stats.clone()));
        Ok(stats)
    }
}
