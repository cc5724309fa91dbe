//! Influence scoring for articles.
//!
//! The score is the sole priority key for the orchestrator's dequeue
//! ordering: higher-influence articles are processed first.

/// Keywords that mark politically consequential content.
const POLITICAL_KEYWORDS: &[&str] = &[
    "president",
    "congress",
    "senate",
    "house",
    "election",
    "vote",
    "campaign",
    "policy",
    "legislation",
    "government",
    "democrat",
    "republican",
    "political",
    "white house",
    "supreme court",
    "federal",
    "state legislature",
    "governor",
    "biden",
    "trump",
    "bill",
    "law",
    "capitol",
    "washington",
];

/// High-reach outlets whose articles get the full source-credibility weight.
const HIGH_INFLUENCE_DOMAINS: &[&str] = &[
    "nytimes.com",
    "washingtonpost.com",
    "wsj.com",
    "reuters.com",
    "apnews.com",
    "politico.com",
    "thehill.com",
    "cnn.com",
    "foxnews.com",
    "nbcnews.com",
    "abcnews.go.com",
];

/// Influence score in [0, 1], pure and deterministic.
///
/// Three independently capped contributions:
/// - source credibility: 0.4 for a curated high-reach domain, 0.2 for any
///   other known source, 0.0 with no source at all
/// - keyword density in content, per 1000 chars, scaled and capped at 0.4
/// - title keyword hits, capped at 0.2
pub fn influence_score(title: &str, content: &str, source_url: Option<&str>) -> f64 {
    let mut score = 0.0;

    if let Some(url) = source_url {
        if HIGH_INFLUENCE_DOMAINS.iter().any(|d| url.contains(d)) {
            score += 0.4;
        } else {
            score += 0.2;
        }
    }

    if !content.is_empty() {
        let content_lower = content.to_lowercase();
        let keyword_count = POLITICAL_KEYWORDS
            .iter()
            .filter(|k| content_lower.contains(*k))
            .count();
        let density = keyword_count as f64 / (content.len() as f64 / 1000.0);
        score += (density * 0.1).min(0.4);
    }

    if !title.is_empty() {
        let title_lower = title.to_lowercase();
        let title_hits = POLITICAL_KEYWORDS
            .iter()
            .filter(|k| title_lower.contains(*k))
            .count();
        score += (title_hits as f64 * 0.1).min(0.2);
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_in_range_for_empty_input() {
        let score = influence_score("", "", None);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_score_never_exceeds_one() {
        let content = "president congress senate election vote campaign ".repeat(50);
        let score = influence_score(
            "President wins election vote in senate",
            &content,
            Some("https://www.reuters.com/rss"),
        );
        assert!(score <= 1.0);
        assert!(score > 0.0);
    }

    #[test]
    fn test_high_reach_domain_beats_baseline() {
        let high = influence_score("", "", Some("https://apnews.com/feed"));
        let low = influence_score("", "", Some("https://smalltownblog.example/feed"));
        assert_eq!(high, 0.4);
        assert_eq!(low, 0.2);
    }

    #[test]
    fn test_title_contribution_capped() {
        // Five keyword hits in the title still contribute at most 0.2.
        let score = influence_score("president senate house election vote", "", None);
        assert_eq!(score, 0.2);
    }

    #[test]
    fn test_content_density_capped() {
        // Short content dense with keywords saturates the 0.4 cap.
        let score = influence_score("", "president congress senate vote", None);
        assert_eq!(score, 0.4);
    }

    #[test]
    fn test_deterministic() {
        let args = ("Senate vote", "The bill passed the senate.", Some("https://thehill.com"));
        assert_eq!(
            influence_score(args.0, args.1, args.2),
            influence_score(args.0, args.1, args.2)
        );
    }
}
