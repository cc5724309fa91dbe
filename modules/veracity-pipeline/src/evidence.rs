//! Keyword-based evidence retrieval over the already-ingested corpus.
//!
//! Deliberately cheap: stop-word-filtered keywords drive an ILIKE search,
//! snippets are cut around the first keyword hit, and relevance is Jaccard
//! similarity over word sets. No external search service is involved.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{info, warn};

use veracity_common::{Claim, EvidenceCandidate};
use veracity_store::Store;

const SNIPPET_LENGTH: usize = 200;
const CONTEXT_LENGTH: usize = 300;
const MAX_SEARCH_KEYWORDS: usize = 5;
const RELEVANCE_FLOOR: f64 = 0.1;

/// Stop words excluded from keyword extraction.
const KEYWORD_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "was", "are", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "to", "of",
    "in", "for", "on", "at", "by", "with", "from", "as", "that", "this", "these", "those", "it",
    "its", "or", "and", "but", "if", "so", "than", "then", "not", "no",
];

/// Smaller stop-word set used when scoring relevance. Scoring keeps more of
/// the text than keyword extraction does.
const RELEVANCE_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "was", "are", "were", "be", "to", "of", "in", "for", "on", "at",
];

pub struct EvidenceSearcher {
    store: Store,
}

impl EvidenceSearcher {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Find up to `max_results` evidence candidates for a claim, best
    /// relevance first. A claim yielding no keywords or no matches gets an
    /// empty result, not an error.
    pub async fn search(&self, claim: &Claim, max_results: usize) -> Result<Vec<EvidenceCandidate>> {
        let keywords = extract_keywords(&claim.claim_text);
        if keywords.is_empty() {
            warn!(claim_id = %claim.id, "No keywords extracted from claim");
            return Ok(Vec::new());
        }

        let patterns: Vec<String> = keywords
            .iter()
            .take(MAX_SEARCH_KEYWORDS)
            .map(|kw| like_pattern(kw))
            .collect();

        // Over-fetch so the relevance floor can prune without starving the
        // result set.
        let corpus = self
            .store
            .search_corpus(&patterns, (max_results * 2) as i64)
            .await?;

        let mut candidates = Vec::new();
        for article in corpus {
            // The claim's own article is not evidence for itself.
            if article.id == claim.article_id {
                continue;
            }
            if article.content.is_empty() {
                continue;
            }

            let snippet = extract_snippet(&article.content, &keywords);
            if snippet.is_empty() {
                continue;
            }

            let relevance = relevance(&claim.claim_text, &snippet);
            if relevance <= RELEVANCE_FLOOR {
                continue;
            }

            candidates.push(EvidenceCandidate {
                article_id: article.id,
                source_url: article.url,
                source_name: article.source_name,
                source_reliability: article.source_reliability,
                context: surrounding_context(&article.content, &snippet),
                snippet,
                relevance_score: relevance,
            });
        }

        let candidates = rank_candidates(candidates, max_results);

        info!(claim_id = %claim.id, found = candidates.len(), "Evidence search complete");
        Ok(candidates)
    }
}

/// Order candidates best-relevance-first and cap the result set. The sort is
/// stable, so equal scores keep their discovery order.
pub fn rank_candidates(
    mut candidates: Vec<EvidenceCandidate>,
    max_results: usize,
) -> Vec<EvidenceCandidate> {
    candidates.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(max_results);
    candidates
}

/// Wrap a keyword in `%...%` with LIKE metacharacters escaped, so a token
/// containing `%` or `_` matches literally instead of widening the search.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Extract searchable keywords from claim text: lowercased, stop words and
/// short tokens removed, first-seen order preserved, no duplicates.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = KEYWORD_STOP_WORDS.iter().copied().collect();

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    for word in text.to_lowercase().replace([',', '.'], " ").split_whitespace() {
        let word = word.trim();
        if word.len() <= 3 || stop.contains(word) {
            continue;
        }
        if seen.insert(word.to_string()) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

/// Cut a snippet of roughly [`SNIPPET_LENGTH`] chars around the first hit of
/// the top keywords, nudged to sentence boundaries, with ellipses marking
/// truncation. No keyword hit falls back to the start of the content.
pub fn extract_snippet(content: &str, keywords: &[String]) -> String {
    if content.is_empty() {
        return String::new();
    }

    let content_lower = content.to_lowercase();
    let hit = keywords
        .iter()
        .take(3)
        .find_map(|kw| content_lower.find(&kw.to_lowercase()));

    let Some(pos) = hit else {
        return truncate_at_boundary(content, SNIPPET_LENGTH).trim().to_string();
    };

    let mut start = floor_char_boundary(content, pos.saturating_sub(SNIPPET_LENGTH / 2));
    let mut end = ceil_char_boundary(content, (pos + SNIPPET_LENGTH / 2).min(content.len()));

    // Prefer starting just after the previous sentence.
    if start > 0 {
        let window_start = floor_char_boundary(content, start.saturating_sub(50));
        if let Some(period) = content[window_start..start].rfind('.') {
            start = window_start + period + 1;
        }
    }
    // Prefer ending at the next sentence.
    if end < content.len() {
        let window_end = ceil_char_boundary(content, (end + 50).min(content.len()));
        if let Some(period) = content[end..window_end].find('.') {
            end = end + period + 1;
        }
    }

    let mut snippet = content[start..end].trim().to_string();
    if start > 0 {
        snippet = format!("...{snippet}");
    }
    if end < content.len() {
        snippet = format!("{snippet}...");
    }
    snippet
}

/// Wider window around a snippet, for display alongside it. Falls back to the
/// snippet itself when it cannot be located in the content.
pub fn surrounding_context(content: &str, snippet: &str) -> String {
    if content.is_empty() || snippet.is_empty() {
        return String::new();
    }

    let clean = snippet.replace("...", "");
    let clean = clean.trim();
    let pos = content
        .find(clean)
        .or_else(|| content.to_lowercase().find(&clean.to_lowercase()));
    let Some(pos) = pos else {
        return snippet.to_string();
    };

    let start = floor_char_boundary(content, pos.saturating_sub(CONTEXT_LENGTH));
    let end = ceil_char_boundary(content, (pos + clean.len() + CONTEXT_LENGTH).min(content.len()));

    let mut context = content[start..end].trim().to_string();
    if start > 0 {
        context = format!("...{context}");
    }
    if end < content.len() {
        context = format!("{context}...");
    }
    context
}

/// Jaccard similarity between the word sets of claim and snippet, common
/// words removed. 0.0 when either side is empty after filtering.
pub fn relevance(claim: &str, snippet: &str) -> f64 {
    let stop: HashSet<&str> = RELEVANCE_STOP_WORDS.iter().copied().collect();
    let tokenize = |text: &str| -> HashSet<String> {
        text.to_lowercase()
            .replace([',', '.'], " ")
            .split_whitespace()
            .filter(|w| !stop.contains(w))
            .map(|w| w.to_string())
            .collect()
    };

    let claim_words = tokenize(claim);
    let snippet_words = tokenize(snippet);
    if claim_words.is_empty() || snippet_words.is_empty() {
        return 0.0;
    }

    let intersection = claim_words.intersection(&snippet_words).count();
    let union = claim_words.union(&snippet_words).count();
    intersection as f64 / union as f64
}

fn truncate_at_boundary(content: &str, max: usize) -> &str {
    &content[..ceil_char_boundary(content, max.min(content.len()))]
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
