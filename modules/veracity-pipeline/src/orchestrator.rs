//! Long-running orchestration: three cadenced loops (feed ingestion, article
//! processing, claim checking) feeding a shared bounded worker pool, plus a
//! reclaim loop that returns wedged work to the queue.
//!
//! Dequeue flips each unit's status before dispatch, so a unit is owned by
//! exactly one worker. Crash recovery is timeout-based: the reclaim loop
//! reverts units stuck in-flight for more than twice the task budget.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Semaphore;
use tokio::time::{interval, timeout};
use tracing::{error, info, warn};

use veracity_common::{Article, ArticleStatus, Claim, ClaimStatus, Config, VeracityError};
use veracity_store::{CachedStats, StatsReader, Store, TimeRange};

use crate::evidence::EvidenceSearcher;
use crate::extractor::ClaimExtractor;
use crate::fact_checker::{build_investigation, label_evidence, FactChecker};
use crate::ingest::FeedIngestor;
use crate::propaganda::PropagandaDetector;

const ARTICLE_BATCH_LIMIT: i64 = 50;
const CLAIM_BATCH_LIMIT: i64 = 20;
const MAX_EVIDENCE_RESULTS: usize = 5;
const UNIT_MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(60);

pub struct Orchestrator {
    store: Store,
    ingestor: FeedIngestor,
    extractor: ClaimExtractor,
    searcher: EvidenceSearcher,
    checker: FactChecker,
    detector: PropagandaDetector,
    stats: CachedStats,
    semaphore: Arc<Semaphore>,
    task_timeout: Duration,
    feed_interval: Duration,
    article_interval: Duration,
    claim_interval: Duration,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &Config,
        store: Store,
        ingestor: FeedIngestor,
        extractor: ClaimExtractor,
        searcher: EvidenceSearcher,
        checker: FactChecker,
        detector: PropagandaDetector,
    ) -> Self {
        let stats = CachedStats::new(StatsReader::new(store.pool().clone()));
        Self {
            store,
            ingestor,
            extractor,
            searcher,
            checker,
            detector,
            stats,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_tasks)),
            task_timeout: Duration::from_secs(config.task_timeout_secs),
            feed_interval: Duration::from_secs(config.feed_fetch_interval_secs),
            article_interval: Duration::from_secs(config.article_batch_interval_secs),
            claim_interval: Duration::from_secs(config.claim_batch_interval_secs),
        }
    }

    /// Run all loops until the process is stopped.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!("Orchestrator starting");

        let feed = tokio::spawn({
            let this = self.clone();
            async move { this.feed_loop().await }
        });
        let articles = tokio::spawn({
            let this = self.clone();
            async move { this.article_loop().await }
        });
        let claims = tokio::spawn({
            let this = self.clone();
            async move { this.claim_loop().await }
        });
        let reclaim = tokio::spawn({
            let this = self.clone();
            async move { this.reclaim_loop().await }
        });
        let stats = tokio::spawn({
            let this = self.clone();
            async move { this.stats_loop().await }
        });

        let _ = tokio::join!(feed, articles, claims, reclaim, stats);
        Ok(())
    }

    async fn feed_loop(&self) {
        let mut ticker = interval(self.feed_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.ingestor.run_cycle().await {
                error!(error = %e, "Feed ingestion cycle failed");
            }
        }
    }

    async fn article_loop(self: Arc<Self>) {
        let mut ticker = interval(self.article_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.article_tick().await {
                error!(error = %e, "Article dispatch failed");
            }
        }
    }

    async fn claim_loop(self: Arc<Self>) {
        let mut ticker = interval(self.claim_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.claim_tick().await {
                error!(error = %e, "Claim dispatch failed");
            }
        }
    }

    /// Revert units stuck in-flight past twice the task budget. Twice, so a
    /// unit still inside its final timed attempt is never stolen.
    async fn reclaim_loop(&self) {
        let stale_after = chrono::Duration::seconds((self.task_timeout.as_secs() * 2) as i64);
        let mut ticker = interval(self.task_timeout);
        loop {
            ticker.tick().await;
            if let Err(e) = self.store.reclaim_stale(stale_after).await {
                error!(error = %e, "Stale reclaim failed");
            }
        }
    }

    /// Periodic operational snapshot, served through the stats cache.
    async fn stats_loop(&self) {
        let mut ticker = interval(self.feed_interval);
        loop {
            ticker.tick().await;
            match self.stats.dashboard(TimeRange::Day).await {
                Ok(stats) => info!(
                    articles = stats.total_articles,
                    claims = stats.total_claims,
                    investigations = stats.total_investigations,
                    pending_articles = stats.queue.pending_articles,
                    pending_claims = stats.queue.pending_claims,
                    "Pipeline status"
                ),
                Err(e) => warn!(error = %e, "Stats rollup failed"),
            }
        }
    }

    async fn article_tick(self: &Arc<Self>) -> Result<()> {
        let articles = self.store.dequeue_pending_articles(ARTICLE_BATCH_LIMIT).await?;
        if articles.is_empty() {
            return Ok(());
        }
        info!(batch = articles.len(), "Dispatching articles for claim extraction");

        for article in articles {
            let permit = self.semaphore.clone().acquire_owned().await?;
            let this = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                this.process_article_with_retry(article).await;
            });
        }
        Ok(())
    }

    async fn claim_tick(self: &Arc<Self>) -> Result<()> {
        let claims = self.store.dequeue_pending_claims(CLAIM_BATCH_LIMIT).await?;
        if claims.is_empty() {
            return Ok(());
        }
        info!(batch = claims.len(), "Dispatching claims for fact-checking");

        for claim in claims {
            let permit = self.semaphore.clone().acquire_owned().await?;
            let this = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                this.process_claim_with_retry(claim).await;
            });
        }
        Ok(())
    }

    /// Drive one article through extraction with the unit retry policy:
    /// bounded attempts for transient failures and timeouts, immediate stop
    /// for anything else, terminal `error` status when attempts run out.
    async fn process_article_with_retry(&self, article: Article) {
        for attempt in 1..=UNIT_MAX_ATTEMPTS {
            match timeout(self.task_timeout, self.process_article(&article)).await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => {
                    warn!(article_id = %article.id, attempt, error = %e, "Article processing failed");
                    if !e.is_transient() {
                        break;
                    }
                }
                Err(_) => {
                    warn!(article_id = %article.id, attempt, "Article processing timed out");
                }
            }
            if attempt < UNIT_MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }

        if let Err(e) = self.store.set_article_status(article.id, ArticleStatus::Error).await {
            error!(article_id = %article.id, error = %e, "Failed to mark article as error");
        }
    }

    async fn process_claim_with_retry(&self, claim: Claim) {
        for attempt in 1..=UNIT_MAX_ATTEMPTS {
            match timeout(self.task_timeout, self.process_claim(&claim)).await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => {
                    warn!(claim_id = %claim.id, attempt, error = %e, "Claim processing failed");
                    if !e.is_transient() {
                        break;
                    }
                }
                Err(_) => {
                    warn!(claim_id = %claim.id, attempt, "Claim processing timed out");
                }
            }
            if attempt < UNIT_MAX_ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }

        if let Err(e) = self.store.set_claim_status(claim.id, ClaimStatus::Error).await {
            error!(claim_id = %claim.id, error = %e, "Failed to mark claim as error");
        }
    }

    /// One article unit: extract claims and persist them. An article that
    /// yields no claims is terminal `error`, matching the queue semantics of
    /// "nothing further will happen here".
    async fn process_article(&self, article: &Article) -> Result<(), VeracityError> {
        let claims = self
            .extractor
            .extract(article)
            .await
            .map_err(|e| VeracityError::Transport(e.to_string()))?;

        if claims.is_empty() {
            self.store
                .set_article_status(article.id, ArticleStatus::Error)
                .await
                .map_err(|e| VeracityError::Database(e.to_string()))?;
            return Ok(());
        }

        // Claims and the status flip commit together, so a retried unit
        // re-extracting after a mid-write failure never duplicates claims.
        self.store
            .complete_article_processing(article.id, &claims)
            .await
            .map_err(|e| VeracityError::Database(e.to_string()))?;
        Ok(())
    }

    /// One claim unit: evidence search, verdict, propaganda scan, then the
    /// single-transaction investigation write that also marks the claim
    /// `verified`.
    async fn process_claim(&self, claim: &Claim) -> Result<(), VeracityError> {
        let candidates = self
            .searcher
            .search(claim, MAX_EVIDENCE_RESULTS)
            .await
            .map_err(|e| VeracityError::Database(e.to_string()))?;

        let verdict = self
            .checker
            .check(claim, &candidates)
            .await
            .map_err(|e| VeracityError::Transport(e.to_string()))?;

        let evidence = label_evidence(candidates, verdict.verdict);
        let signals = self.detector.detect(&claim.claim_text).await;
        let investigation = build_investigation(claim.id, verdict, &evidence, signals);

        self.store
            .create_investigation(&investigation, &evidence)
            .await
            .map_err(|e| VeracityError::Database(e.to_string()))?;
        Ok(())
    }
}
