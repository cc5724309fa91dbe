//! sqlx::FromRow impls for the core entity types.
//!
//! These live here (rather than in veracity-store) because Rust's orphan
//! rules require the impls to be in the crate that defines the types.

use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::types::{Article, ArticleStatus, Claim, ClaimStatus, ClaimType, Source};

fn decode_status<T>(parsed: Option<T>, column: &str, raw: &str) -> std::result::Result<T, sqlx::Error> {
    parsed.ok_or_else(|| sqlx::Error::Decode(format!("unknown {column}: {raw}").into()))
}

impl<'r> sqlx::FromRow<'r, PgRow> for Source {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Source {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            url: row.try_get("url")?,
            reliability_score: row.try_get("reliability_score")?,
            active: row.try_get("active")?,
            fetch_interval_minutes: row.try_get("fetch_interval_minutes")?,
            last_fetched_at: row.try_get("last_fetched_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for Article {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Article {
            id: row.try_get("id")?,
            source_id: row.try_get("source_id")?,
            title: row.try_get("title")?,
            url: row.try_get("url")?,
            author: row.try_get("author")?,
            published_at: row.try_get("published_at")?,
            content: row.try_get("content")?,
            content_hash: row.try_get("content_hash")?,
            influence_score: row.try_get("influence_score")?,
            status: decode_status(ArticleStatus::parse(&status), "article status", &status)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, PgRow> for Claim {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let claim_type: String = row.try_get("claim_type")?;
        Ok(Claim {
            id: row.try_get("id")?,
            article_id: row.try_get("article_id")?,
            claim_text: row.try_get("claim_text")?,
            claim_type: ClaimType::parse_lenient(&claim_type),
            context: row.try_get("context")?,
            is_checkable: row.try_get("is_checkable")?,
            extraction_confidence: row.try_get("extraction_confidence")?,
            status: decode_status(ClaimStatus::parse(&status), "claim status", &status)?,
            created_at: row.try_get("created_at")?,
        })
    }
}
