//! Claim extraction: one inference call per article, lenient parsing of the
//! model's claim list.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use ollama_client::TextGenerator;
use veracity_common::{Article, ClaimType, NewClaim};

use crate::inference::{infer_structured, Outcome};
use crate::prompts;

/// Raw claim shape as the model emits it, before domain validation.
#[derive(Debug, Deserialize)]
struct ClaimDraft {
    #[serde(default)]
    claim_text: String,
    #[serde(default = "default_claim_type")]
    claim_type: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    checkability: f64,
}

fn default_claim_type() -> String {
    "factual".to_string()
}

pub struct ClaimExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl ClaimExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Extract checkable claims from an article. Malformed model output after
    /// retries degrades to an empty list; only transport failure is an error.
    pub async fn extract(&self, article: &Article) -> Result<Vec<NewClaim>> {
        if article.content.is_empty() {
            warn!(article_id = %article.id, "Article has no content, skipping extraction");
            return Ok(Vec::new());
        }

        let prompt = prompts::claim_extraction(&article.content);
        let outcome = infer_structured(self.generator.as_ref(), &prompt, parse_claim_drafts).await?;

        let drafts = match outcome {
            Outcome::Valid(drafts) => drafts,
            Outcome::Malformed => {
                warn!(article_id = %article.id, "Claim extraction output unusable, treating as no claims");
                return Ok(Vec::new());
            }
        };

        let claims: Vec<NewClaim> = drafts
            .into_iter()
            .filter(|draft| !draft.claim_text.trim().is_empty())
            .map(|draft| {
                NewClaim::new(
                    article.id,
                    draft.claim_text,
                    ClaimType::parse_lenient(&draft.claim_type),
                    draft.context,
                    draft.checkability.clamp(0.0, 1.0),
                )
            })
            .collect();

        info!(article_id = %article.id, count = claims.len(), "Claims extracted");
        Ok(claims)
    }
}

/// Accept either a bare JSON array of claims or an object wrapping it under
/// a `claims` key. Anything else fails shape validation.
fn parse_claim_drafts(value: &Value) -> Option<Vec<ClaimDraft>> {
    let array = match value {
        Value::Array(_) => value,
        Value::Object(map) => map.get("claims").filter(|v| v.is_array())?,
        _ => return None,
    };
    serde_json::from_value(array.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::ScriptedGenerator;
    use chrono::Utc;
    use uuid::Uuid;
    use veracity_common::ArticleStatus;

    fn article(content: &str) -> Article {
        Article {
            id: Uuid::new_v4(),
            source_id: Uuid::new_v4(),
            title: "Budget report".to_string(),
            url: "https://wire.example/a1".to_string(),
            author: None,
            published_at: None,
            content: content.to_string(),
            content_hash: "abc".to_string(),
            influence_score: 0.5,
            status: ArticleStatus::Processing,
            created_at: Utc::now(),
        }
    }

    fn extractor(generator: ScriptedGenerator) -> ClaimExtractor {
        ClaimExtractor::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn bare_array_shape_is_parsed() {
        let reply = r#"[
            {"claim_text": "Budget doubled", "claim_type": "statistic", "context": "...", "checkability": 0.9},
            {"claim_text": "Mayor resigned", "claim_type": "factual", "context": "...", "checkability": 0.3}
        ]"#;
        let claims = extractor(ScriptedGenerator::always_ok(reply))
            .extract(&article("text"))
            .await
            .unwrap();

        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].claim_type, ClaimType::Statistic);
        assert!(claims[0].is_checkable);
        assert!(!claims[1].is_checkable);
    }

    #[tokio::test]
    async fn wrapped_object_shape_is_parsed() {
        let reply = r#"{"claims": [{"claim_text": "Budget doubled", "checkability": 0.8}]}"#;
        let claims = extractor(ScriptedGenerator::always_ok(reply))
            .extract(&article("text"))
            .await
            .unwrap();

        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].claim_type, ClaimType::Factual);
    }

    #[tokio::test]
    async fn unknown_claim_type_falls_back_to_factual() {
        let reply = r#"[{"claim_text": "X", "claim_type": "prophecy", "checkability": 0.7}]"#;
        let claims = extractor(ScriptedGenerator::always_ok(reply))
            .extract(&article("text"))
            .await
            .unwrap();
        assert_eq!(claims[0].claim_type, ClaimType::Factual);
    }

    #[tokio::test]
    async fn empty_claim_text_is_dropped() {
        let reply = r#"[{"claim_text": "  ", "checkability": 0.9}, {"claim_text": "Real", "checkability": 0.9}]"#;
        let claims = extractor(ScriptedGenerator::always_ok(reply))
            .extract(&article("text"))
            .await
            .unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].claim_text, "Real");
    }

    #[tokio::test]
    async fn malformed_output_degrades_to_empty() {
        let claims = extractor(ScriptedGenerator::always_ok("the article has claims"))
            .extract(&article("text"))
            .await
            .unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn empty_article_skips_inference() {
        let generator = ScriptedGenerator::always_ok("[]");
        let extractor = ClaimExtractor::new(Arc::new(generator));
        let claims = extractor.extract(&article("")).await.unwrap();
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let result = extractor(ScriptedGenerator::always_err("refused"))
            .extract(&article("text"))
            .await;
        assert!(result.is_err());
    }
}
