//! Feed ingestion: fetch each due source's RSS/Atom feed, normalize entries
//! into articles, and enqueue them as `pending`. Duplicate URLs are silently
//! skipped so re-fetching a feed is idempotent.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use veracity_common::{influence_score, normalize_content, NewArticle, Source};
use veracity_store::Store;

const FEED_FETCH_CONCURRENCY: usize = 4;

pub struct FeedIngestor {
    store: Store,
    client: reqwest::Client,
}

impl FeedIngestor {
    pub fn new(store: Store) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("veracity/0.1")
            .build()
            .expect("Failed to build feed HTTP client");
        Self { store, client }
    }

    /// Fetch every active source that is due per its own cadence, a few in
    /// flight at a time. A failing source is logged and skipped; it never
    /// blocks the others.
    pub async fn run_cycle(&self) -> Result<()> {
        let sources = self.store.active_sources().await?;
        let now = Utc::now();
        let due: Vec<Source> = sources.into_iter().filter(|s| is_due(s, now)).collect();

        stream::iter(due)
            .for_each_concurrent(FEED_FETCH_CONCURRENCY, |source| async move {
                match self.fetch_source(&source).await {
                    Ok(added) => {
                        info!(source = source.name.as_str(), added, "Feed fetched");
                    }
                    Err(e) => {
                        error!(source = source.name.as_str(), error = %e, "Feed fetch failed");
                    }
                }
            })
            .await;
        Ok(())
    }

    /// Fetch and store one source's feed. Returns the number of new articles.
    async fn fetch_source(&self, source: &Source) -> Result<usize> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .context("Feed fetch failed")?
            .error_for_status()
            .context("Feed returned error status")?;

        let bytes = resp.bytes().await.context("Failed to read feed body")?;
        let feed = feed_rs::parser::parse(&bytes[..]).context("Failed to parse RSS/Atom feed")?;

        let mut added = 0usize;
        for entry in feed.entries {
            let Some(article) = entry_to_article(entry, source) else {
                debug!(source = source.name.as_str(), "Skipping feed entry without URL");
                continue;
            };

            match self.store.insert_article(&article).await? {
                Some(_) => added += 1,
                None => debug!(url = article.url.as_str(), "Article already ingested"),
            }
        }

        self.store.touch_source_fetched(source.id).await?;
        Ok(added)
    }
}

/// Whether a source's own fetch cadence has elapsed. Never-fetched sources
/// are always due.
pub fn is_due(source: &Source, now: DateTime<Utc>) -> bool {
    match source.last_fetched_at {
        None => true,
        Some(last) => now - last >= chrono::Duration::minutes(source.fetch_interval_minutes as i64),
    }
}

/// Map a feed entry onto a new article: redacted content, fingerprint, and
/// influence score all computed here. Entries without a resolvable URL are
/// dropped.
pub fn entry_to_article(entry: feed_rs::model::Entry, source: &Source) -> Option<NewArticle> {
    let url = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let author = entry
        .authors
        .first()
        .map(|p| p.name.trim().to_string())
        .filter(|a| !a.is_empty());

    let published_at = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.with_timezone(&Utc));

    // Full content body when the feed carries one, summary otherwise.
    let raw_content = entry
        .content
        .and_then(|c| c.body)
        .filter(|body| !body.trim().is_empty())
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    let normalized = normalize_content(&raw_content);
    if normalized.pii_redactions > 0 {
        warn!(
            url = url.as_str(),
            redactions = normalized.pii_redactions,
            "Redacted PII from article content"
        );
    }

    let score = influence_score(&title, &normalized.text, Some(&source.url));

    Some(NewArticle {
        source_id: source.id,
        title,
        url,
        author,
        published_at,
        content: normalized.text,
        content_hash: normalized.fingerprint,
        influence_score: score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn source() -> Source {
        Source {
            id: Uuid::new_v4(),
            name: "Wire".to_string(),
            url: "https://wire.example/feed.xml".to_string(),
            reliability_score: 0.8,
            active: true,
            fetch_interval_minutes: 60,
            last_fetched_at: None,
            created_at: Utc::now(),
        }
    }

    fn parse_feed(xml: &str) -> Vec<feed_rs::model::Entry> {
        feed_rs::parser::parse(xml.as_bytes()).unwrap().entries
    }

    const FEED: &str = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
            <title>Wire</title>
            <item>
                <title>Budget doubled</title>
                <link>https://wire.example/budget</link>
                <author>jo@wire.example (Jo Reporter)</author>
                <description>Summary text about the election budget.</description>
            </item>
            <item>
                <title>No link here</title>
                <description>Orphan entry.</description>
            </item>
        </channel></rss>"#;

    #[test]
    fn test_entry_mapping_and_orphan_drop() {
        let source = source();
        let entries = parse_feed(FEED);
        assert_eq!(entries.len(), 2);

        let articles: Vec<_> = entries
            .into_iter()
            .filter_map(|e| entry_to_article(e, &source))
            .collect();
        assert_eq!(articles.len(), 1);

        let article = &articles[0];
        assert_eq!(article.title, "Budget doubled");
        assert_eq!(article.url, "https://wire.example/budget");
        assert_eq!(article.content, "Summary text about the election budget.");
        assert_eq!(article.source_id, source.id);
        // Known source URL plus the "election" keyword keeps this above zero.
        assert!(article.influence_score > 0.0);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let source = source();
        let a = entry_to_article(parse_feed(FEED).remove(0), &source).unwrap();
        let b = entry_to_article(parse_feed(FEED).remove(0), &source).unwrap();
        assert_eq!(a.content_hash, b.content_hash);
        assert!(!a.content_hash.is_empty());
    }

    #[test]
    fn test_due_when_never_fetched() {
        assert!(is_due(&source(), Utc::now()));
    }

    #[test]
    fn test_due_follows_fetch_interval() {
        let now = Utc::now();
        let mut source = source();

        source.last_fetched_at = Some(now - chrono::Duration::minutes(30));
        assert!(!is_due(&source, now));

        source.last_fetched_at = Some(now - chrono::Duration::minutes(61));
        assert!(is_due(&source, now));
    }
}
