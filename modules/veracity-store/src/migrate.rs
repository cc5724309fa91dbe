//! First-boot schema. Every statement is idempotent so migrate can run on
//! each startup.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sources (
        id                     UUID         PRIMARY KEY,
        name                   TEXT         NOT NULL,
        url                    TEXT         NOT NULL UNIQUE,
        reliability_score      DOUBLE PRECISION NOT NULL DEFAULT 0.5,
        active                 BOOLEAN      NOT NULL DEFAULT TRUE,
        fetch_interval_minutes INT          NOT NULL DEFAULT 60,
        last_fetched_at        TIMESTAMPTZ,
        created_at             TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id              UUID         PRIMARY KEY,
        source_id       UUID         NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
        title           TEXT         NOT NULL,
        url             TEXT         NOT NULL UNIQUE,
        author          TEXT,
        published_at    TIMESTAMPTZ,
        content         TEXT         NOT NULL,
        content_hash    TEXT         NOT NULL,
        influence_score DOUBLE PRECISION NOT NULL DEFAULT 0,
        status          TEXT         NOT NULL DEFAULT 'pending',
        created_at      TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at      TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS claims (
        id                    UUID         PRIMARY KEY,
        article_id            UUID         NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
        claim_text            TEXT         NOT NULL,
        claim_type            TEXT         NOT NULL DEFAULT 'factual',
        context               TEXT         NOT NULL DEFAULT '',
        is_checkable          BOOLEAN      NOT NULL DEFAULT TRUE,
        extraction_confidence DOUBLE PRECISION NOT NULL DEFAULT 0,
        status                TEXT         NOT NULL DEFAULT 'pending',
        created_at            TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at            TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS investigations (
        id                        UUID         PRIMARY KEY,
        claim_id                  UUID         NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
        verdict                   TEXT         NOT NULL,
        confidence                DOUBLE PRECISION NOT NULL DEFAULT 0,
        summary                   TEXT         NOT NULL DEFAULT '',
        reasoning                 TEXT         NOT NULL DEFAULT '',
        propaganda_signals        JSONB        NOT NULL DEFAULT '{}'::jsonb,
        source_reliability_avg    DOUBLE PRECISION NOT NULL DEFAULT 0,
        evidence_count            INT          NOT NULL DEFAULT 0,
        supporting_evidence_count INT          NOT NULL DEFAULT 0,
        refuting_evidence_count   INT          NOT NULL DEFAULT 0,
        status                    TEXT         NOT NULL DEFAULT 'in_progress',
        created_at                TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS evidence (
        id                 UUID         PRIMARY KEY,
        investigation_id   UUID         NOT NULL REFERENCES investigations(id) ON DELETE CASCADE,
        source_url         TEXT         NOT NULL,
        source_name        TEXT         NOT NULL DEFAULT '',
        source_reliability DOUBLE PRECISION NOT NULL DEFAULT 0,
        snippet            TEXT         NOT NULL DEFAULT '',
        context            TEXT         NOT NULL DEFAULT '',
        stance             TEXT         NOT NULL DEFAULT 'neutral',
        relevance_score    DOUBLE PRECISION NOT NULL DEFAULT 0,
        created_at         TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
    "#,
    // Indexes backing the orchestrator's priority queries and the read-side
    // filters.
    "CREATE INDEX IF NOT EXISTS ix_articles_status ON articles(status)",
    "CREATE INDEX IF NOT EXISTS ix_articles_influence ON articles(influence_score)",
    "CREATE INDEX IF NOT EXISTS ix_articles_source ON articles(source_id)",
    "CREATE INDEX IF NOT EXISTS ix_claims_status ON claims(status)",
    "CREATE INDEX IF NOT EXISTS ix_claims_article ON claims(article_id)",
    "CREATE INDEX IF NOT EXISTS ix_claims_checkable ON claims(is_checkable)",
    "CREATE INDEX IF NOT EXISTS ix_investigations_claim ON investigations(claim_id)",
    "CREATE INDEX IF NOT EXISTS ix_investigations_status ON investigations(status)",
    "CREATE INDEX IF NOT EXISTS ix_investigations_verdict ON investigations(verdict)",
    "CREATE INDEX IF NOT EXISTS ix_evidence_investigation ON evidence(investigation_id)",
];

pub async fn migrate(pool: &PgPool) -> Result<()> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    info!(statements = DDL.len(), "Schema migration complete");
    Ok(())
}
