//! Integration tests for Store.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use sqlx::PgPool;
use uuid::Uuid;

use veracity_common::{
    ArticleStatus, ClaimStatus, ClaimType, InvestigationStatus, NewArticle, NewClaim, NewEvidence,
    NewInvestigation, PropagandaSignals, Stance, Verdict,
};
use veracity_store::{migrate, Store};

/// Get a test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    migrate(&pool).await.ok()?;

    // Clean slate for each test
    sqlx::query("TRUNCATE sources, articles, claims, investigations, evidence CASCADE")
        .execute(&pool)
        .await
        .ok()?;

    Some(pool)
}

fn article(source_id: Uuid, url: &str, influence: f64) -> NewArticle {
    NewArticle {
        source_id,
        title: format!("Article at {url}"),
        url: url.to_string(),
        author: None,
        published_at: None,
        content: "Body text.".to_string(),
        content_hash: "deadbeef".to_string(),
        influence_score: influence,
    }
}

// =========================================================================
// Dedup
// =========================================================================

#[tokio::test]
async fn duplicate_url_insert_is_a_noop() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool);

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();

    let first = store
        .insert_article(&article(source_id, "https://wire.example/a1", 0.4))
        .await
        .unwrap();
    assert!(first.is_some());

    // Same URL, different everything else: skipped, original row untouched.
    let mut dup = article(source_id, "https://wire.example/a1", 0.9);
    dup.title = "Retitled".to_string();
    let second = store.insert_article(&dup).await.unwrap();
    assert!(second.is_none());

    let stored = store.article_by_id(first.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.title, "Article at https://wire.example/a1");
    assert_eq!(stored.influence_score, 0.4);
}

// =========================================================================
// Dequeue ordering and batch caps
// =========================================================================

#[tokio::test]
async fn dequeue_respects_limit_and_influence_order() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool);

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();

    for i in 0..60 {
        store
            .insert_article(&article(
                source_id,
                &format!("https://wire.example/a{i}"),
                i as f64 / 100.0,
            ))
            .await
            .unwrap();
    }

    let batch = store.dequeue_pending_articles(50).await.unwrap();
    assert_eq!(batch.len(), 50);
    for pair in batch.windows(2) {
        assert!(pair[0].influence_score >= pair[1].influence_score);
    }
    // Lowest-influence ten remain pending for the next tick.
    assert!(batch.iter().all(|a| a.influence_score >= 0.10));
    assert!(batch.iter().all(|a| a.status == ArticleStatus::Processing));

    let remainder = store.dequeue_pending_articles(50).await.unwrap();
    assert_eq!(remainder.len(), 10);
}

#[tokio::test]
async fn dequeue_skips_uncheckable_and_inflight_claims() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool);

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();
    let article_id = store
        .insert_article(&article(source_id, "https://wire.example/a1", 0.5))
        .await
        .unwrap()
        .unwrap();

    let claims = vec![
        NewClaim::new(
            article_id,
            "The budget doubled".into(),
            ClaimType::Statistic,
            "".into(),
            0.9,
        ),
        // Low confidence, not checkable, must never be dequeued.
        NewClaim::new(
            article_id,
            "Things are bad".into(),
            ClaimType::Factual,
            "".into(),
            0.3,
        ),
    ];
    store.insert_claims(&claims).await.unwrap();

    let batch = store.dequeue_pending_claims(20).await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].claim_text, "The budget doubled");
    assert_eq!(batch[0].status, ClaimStatus::Checking);

    // Already checking, not eligible again.
    let again = store.dequeue_pending_claims(20).await.unwrap();
    assert!(again.is_empty());
}

// =========================================================================
// Article completion transaction
// =========================================================================

#[tokio::test]
async fn article_completion_commits_claims_and_status_together() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool.clone());

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();
    let article_id = store
        .insert_article(&article(source_id, "https://wire.example/a1", 0.5))
        .await
        .unwrap()
        .unwrap();
    store.dequeue_pending_articles(1).await.unwrap();

    let claims = vec![NewClaim::new(
        article_id,
        "The budget doubled".into(),
        ClaimType::Statistic,
        "".into(),
        0.9,
    )];
    store
        .complete_article_processing(article_id, &claims)
        .await
        .unwrap();

    let stored = store.article_by_id(article_id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Processed);
    let claim_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM claims WHERE article_id = $1")
            .bind(article_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(claim_count, 1);
}

#[tokio::test]
async fn failed_article_completion_rolls_back_entirely() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool.clone());

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();
    let article_id = store
        .insert_article(&article(source_id, "https://wire.example/a1", 0.5))
        .await
        .unwrap()
        .unwrap();
    store.dequeue_pending_articles(1).await.unwrap();

    // Second claim violates the article FK, aborting the transaction. The
    // first claim and the status flip must both be rolled back, leaving the
    // unit safe to retry from scratch.
    let claims = vec![
        NewClaim::new(
            article_id,
            "The budget doubled".into(),
            ClaimType::Statistic,
            "".into(),
            0.9,
        ),
        NewClaim::new(
            Uuid::new_v4(),
            "Orphan claim".into(),
            ClaimType::Factual,
            "".into(),
            0.9,
        ),
    ];
    let result = store.complete_article_processing(article_id, &claims).await;
    assert!(result.is_err());

    let stored = store.article_by_id(article_id).await.unwrap().unwrap();
    assert_eq!(stored.status, ArticleStatus::Processing);
    let claim_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM claims WHERE article_id = $1")
            .bind(article_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(claim_count, 0);
}

// =========================================================================
// Investigation transaction
// =========================================================================

#[tokio::test]
async fn investigation_write_is_atomic_and_verifies_claim() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool.clone());

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();
    let article_id = store
        .insert_article(&article(source_id, "https://wire.example/a1", 0.5))
        .await
        .unwrap()
        .unwrap();
    store
        .insert_claims(&[NewClaim::new(
            article_id,
            "The budget doubled".into(),
            ClaimType::Statistic,
            "".into(),
            0.9,
        )])
        .await
        .unwrap();
    let claim = store
        .dequeue_pending_claims(1)
        .await
        .unwrap()
        .pop()
        .unwrap();

    let investigation = NewInvestigation {
        claim_id: claim.id,
        verdict: Verdict::MostlyTrue,
        confidence: 0.7,
        summary: "Largely accurate".into(),
        reasoning: "Two of three sources agree".into(),
        propaganda_signals: PropagandaSignals::default(),
        source_reliability_avg: 0.75,
        evidence_count: 2,
        supporting_evidence_count: 2,
        refuting_evidence_count: 0,
        status: InvestigationStatus::Completed,
    };
    let evidence = vec![
        NewEvidence {
            source_url: "https://wire.example/a2".into(),
            source_name: "Wire".into(),
            source_reliability: 0.8,
            snippet: "...budget doubled...".into(),
            context: "Fiscal report".into(),
            stance: Stance::Supporting,
            relevance_score: 0.6,
        },
        NewEvidence {
            source_url: "https://wire.example/a3".into(),
            source_name: "Wire".into(),
            source_reliability: 0.7,
            snippet: "...spending up...".into(),
            context: "Follow-up".into(),
            stance: Stance::Supporting,
            relevance_score: 0.4,
        },
    ];

    let investigation_id = store
        .create_investigation(&investigation, &evidence)
        .await
        .unwrap();

    // Evidence rows landed with the verdict, claim flipped to verified.
    let evidence_count: i64 =
        sqlx::query_scalar("SELECT count(*) FROM evidence WHERE investigation_id = $1")
            .bind(investigation_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(evidence_count, 2);

    let claim = store.claim_by_id(claim.id).await.unwrap().unwrap();
    assert_eq!(claim.status, ClaimStatus::Verified);
}

// =========================================================================
// Stale reclaim
// =========================================================================

#[tokio::test]
async fn reclaim_reverts_only_stale_inflight_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let store = Store::new(pool.clone());

    let source_id = store
        .insert_source("Wire", "https://wire.example/feed", 0.8, 60)
        .await
        .unwrap();
    let stale_id = store
        .insert_article(&article(source_id, "https://wire.example/stale", 0.5))
        .await
        .unwrap()
        .unwrap();
    let fresh_id = store
        .insert_article(&article(source_id, "https://wire.example/fresh", 0.5))
        .await
        .unwrap()
        .unwrap();
    let done_id = store
        .insert_article(&article(source_id, "https://wire.example/done", 0.5))
        .await
        .unwrap()
        .unwrap();

    store.dequeue_pending_articles(50).await.unwrap();
    store
        .set_article_status(done_id, ArticleStatus::Processed)
        .await
        .unwrap();

    // Backdate one in-flight row past the cutoff.
    sqlx::query("UPDATE articles SET updated_at = now() - interval '1 hour' WHERE id = $1")
        .bind(stale_id)
        .execute(&pool)
        .await
        .unwrap();

    let (articles, claims) = store
        .reclaim_stale(chrono::Duration::minutes(10))
        .await
        .unwrap();
    assert_eq!(articles, 1);
    assert_eq!(claims, 0);

    let stale = store.article_by_id(stale_id).await.unwrap().unwrap();
    assert_eq!(stale.status, ArticleStatus::Pending);
    let fresh = store.article_by_id(fresh_id).await.unwrap().unwrap();
    assert_eq!(fresh.status, ArticleStatus::Processing);
    // Terminal status is never reclaimed.
    let done = store.article_by_id(done_id).await.unwrap().unwrap();
    assert_eq!(done.status, ArticleStatus::Processed);
}
