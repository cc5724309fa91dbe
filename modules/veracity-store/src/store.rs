//! Store — the relational single source of truth for the pipeline.
//!
//! Every status transition is a single atomic UPDATE. Investigation and
//! Evidence rows for a claim are written in one transaction so readers never
//! see a verdict without its evidence.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use veracity_common::{
    Article, ArticleStatus, Claim, ClaimStatus, NewArticle, NewClaim, NewEvidence,
    NewInvestigation, Source,
};

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

/// Article projection used as the evidence-search corpus, with its source's
/// name and reliability joined in.
#[derive(Debug, Clone)]
pub struct CorpusArticle {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub content: String,
    pub source_name: String,
    pub source_reliability: f64,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    pub async fn insert_source(
        &self,
        name: &str,
        url: &str,
        reliability_score: f64,
        fetch_interval_minutes: i32,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO sources (id, name, url, reliability_score, fetch_interval_minutes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(url)
        .bind(reliability_score)
        .bind(fetch_interval_minutes)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn active_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, Source>(
            r#"
            SELECT id, name, url, reliability_score, active, fetch_interval_minutes,
                   last_fetched_at, created_at
            FROM sources
            WHERE active = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn touch_source_fetched(&self, source_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET last_fetched_at = now() WHERE id = $1")
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Articles
    // -----------------------------------------------------------------------

    /// Insert an article, skipping silently when its URL already exists.
    /// Returns the new id, or None for the benign duplicate case.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<Option<Uuid>> {
        let id = Uuid::new_v4();
        let row = sqlx::query(
            r#"
            INSERT INTO articles
                (id, source_id, title, url, author, published_at, content,
                 content_hash, influence_score, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            ON CONFLICT (url) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.author)
        .bind(article.published_at)
        .bind(&article.content)
        .bind(&article.content_hash)
        .bind(article.influence_score)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

    pub async fn article_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, source_id, title, url, author, published_at, content,
                   content_hash, influence_score, status, created_at
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Pull the next batch of pending articles, highest influence first, and
    /// mark them `processing` before returning — dequeue flips status ahead
    /// of dispatch so no article is picked up twice.
    pub async fn dequeue_pending_articles(&self, limit: i64) -> Result<Vec<Article>> {
        let mut tx = self.pool.begin().await?;

        let mut articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, source_id, title, url, author, published_at, content,
                   content_hash, influence_score, status, created_at
            FROM articles
            WHERE status = 'pending'
            ORDER BY influence_score DESC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        sqlx::query(
            "UPDATE articles SET status = 'processing', updated_at = now() WHERE id = ANY($1)",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        for article in &mut articles {
            article.status = ArticleStatus::Processing;
        }
        Ok(articles)
    }

    pub async fn set_article_status(&self, id: Uuid, status: ArticleStatus) -> Result<()> {
        sqlx::query("UPDATE articles SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Claims
    // -----------------------------------------------------------------------

    pub async fn insert_claims(&self, claims: &[NewClaim]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for claim in claims {
            sqlx::query(
                r#"
                INSERT INTO claims
                    (id, article_id, claim_text, claim_type, context,
                     is_checkable, extraction_confidence, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(claim.article_id)
            .bind(&claim.claim_text)
            .bind(claim.claim_type.as_str())
            .bind(&claim.context)
            .bind(claim.is_checkable)
            .bind(claim.extraction_confidence)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(claims.len())
    }

    /// Persist an article's extracted claims and flip the article to
    /// `processed` in one transaction. A failure anywhere leaves the article
    /// in its prior status with no claims written, so a retried unit can
    /// safely re-extract without duplicating claim rows.
    pub async fn complete_article_processing(
        &self,
        article_id: Uuid,
        claims: &[NewClaim],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for claim in claims {
            sqlx::query(
                r#"
                INSERT INTO claims
                    (id, article_id, claim_text, claim_type, context,
                     is_checkable, extraction_confidence, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(claim.article_id)
            .bind(&claim.claim_text)
            .bind(claim.claim_type.as_str())
            .bind(&claim.context)
            .bind(claim.is_checkable)
            .bind(claim.extraction_confidence)
            .execute(&mut *tx)
            .await?;
        }
        sqlx::query("UPDATE articles SET status = 'processed', updated_at = now() WHERE id = $1")
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn claim_by_id(&self, id: Uuid) -> Result<Option<Claim>> {
        let row = sqlx::query_as::<_, Claim>(
            r#"
            SELECT id, article_id, claim_text, claim_type, context, is_checkable,
                   extraction_confidence, status, created_at
            FROM claims
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Pull the next batch of pending, checkable claims ordered by their
    /// article's influence score, marking them `checking` before return.
    pub async fn dequeue_pending_claims(&self, limit: i64) -> Result<Vec<Claim>> {
        let mut tx = self.pool.begin().await?;

        let mut claims = sqlx::query_as::<_, Claim>(
            r#"
            SELECT c.id, c.article_id, c.claim_text, c.claim_type, c.context,
                   c.is_checkable, c.extraction_confidence, c.status, c.created_at
            FROM claims c
            JOIN articles a ON a.id = c.article_id
            WHERE c.status = 'pending' AND c.is_checkable = TRUE
            ORDER BY a.influence_score DESC
            LIMIT $1
            FOR UPDATE OF c SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<Uuid> = claims.iter().map(|c| c.id).collect();
        sqlx::query(
            "UPDATE claims SET status = 'checking', updated_at = now() WHERE id = ANY($1)",
        )
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        for claim in &mut claims {
            claim.status = ClaimStatus::Checking;
        }
        Ok(claims)
    }

    pub async fn set_claim_status(&self, id: Uuid, status: ClaimStatus) -> Result<()> {
        sqlx::query("UPDATE claims SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Evidence corpus
    // -----------------------------------------------------------------------

    /// Processed articles whose title or content matches any of the given
    /// ILIKE patterns, with source name and reliability joined in.
    pub async fn search_corpus(
        &self,
        patterns: &[String],
        limit: i64,
    ) -> Result<Vec<CorpusArticle>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT a.id, a.url, a.title, a.content, s.name AS source_name,
                   s.reliability_score AS source_reliability
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            WHERE a.status = 'processed'
              AND EXISTS (
                  SELECT 1 FROM unnest($1::text[]) AS kw
                  WHERE a.title ILIKE kw OR a.content ILIKE kw
              )
            ORDER BY a.created_at ASC
            LIMIT $2
            "#,
        )
        .bind(patterns)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CorpusArticle {
                id: r.get("id"),
                url: r.get("url"),
                title: r.get("title"),
                content: r.get("content"),
                source_name: r.get("source_name"),
                source_reliability: r.get("source_reliability"),
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Investigations
    // -----------------------------------------------------------------------

    /// Write the investigation, its evidence rows, and the claim's terminal
    /// status in one transaction. Partial investigations (a verdict without
    /// its evidence) are never visible to readers.
    pub async fn create_investigation(
        &self,
        investigation: &NewInvestigation,
        evidence: &[NewEvidence],
    ) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;

        let investigation_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO investigations
                (id, claim_id, verdict, confidence, summary, reasoning,
                 propaganda_signals, source_reliability_avg, evidence_count,
                 supporting_evidence_count, refuting_evidence_count, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(investigation_id)
        .bind(investigation.claim_id)
        .bind(investigation.verdict.as_str())
        .bind(investigation.confidence)
        .bind(&investigation.summary)
        .bind(&investigation.reasoning)
        .bind(serde_json::to_value(&investigation.propaganda_signals)?)
        .bind(investigation.source_reliability_avg)
        .bind(investigation.evidence_count)
        .bind(investigation.supporting_evidence_count)
        .bind(investigation.refuting_evidence_count)
        .bind(investigation.status.as_str())
        .execute(&mut *tx)
        .await?;

        for item in evidence {
            sqlx::query(
                r#"
                INSERT INTO evidence
                    (id, investigation_id, source_url, source_name, source_reliability,
                     snippet, context, stance, relevance_score)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(investigation_id)
            .bind(&item.source_url)
            .bind(&item.source_name)
            .bind(item.source_reliability)
            .bind(&item.snippet)
            .bind(&item.context)
            .bind(item.stance.as_str())
            .bind(item.relevance_score)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE claims SET status = 'verified', updated_at = now() WHERE id = $1")
            .bind(investigation.claim_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(investigation_id)
    }

    // -----------------------------------------------------------------------
    // Reclaim
    // -----------------------------------------------------------------------

    /// Revert rows wedged in a non-terminal in-flight status for longer than
    /// `stale_after` back to `pending`. Terminal statuses are untouched, so a
    /// unit that finishes just after its timeout still wins: its terminal
    /// UPDATE is atomic and this reclaim no longer matches the row.
    pub async fn reclaim_stale(&self, stale_after: Duration) -> Result<(u64, u64)> {
        let cutoff: DateTime<Utc> = Utc::now() - stale_after;

        let articles = sqlx::query(
            "UPDATE articles SET status = 'pending', updated_at = now()
             WHERE status = 'processing' AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let claims = sqlx::query(
            "UPDATE claims SET status = 'pending', updated_at = now()
             WHERE status = 'checking' AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if articles > 0 || claims > 0 {
            warn!(articles, claims, "Reclaimed stale in-flight entities");
        }

        Ok((articles, claims))
    }
}

