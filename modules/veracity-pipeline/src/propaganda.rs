//! Propaganda technique detection. Strictly best-effort: any failure, model
//! or transport, degrades to an empty signal set so it can never block a
//! verdict.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use ollama_client::TextGenerator;
use veracity_common::{PropagandaSignals, PropagandaTechnique};

use crate::inference::{infer_structured, Outcome};
use crate::prompts;

pub struct PropagandaDetector {
    generator: Arc<dyn TextGenerator>,
}

impl PropagandaDetector {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn detect(&self, text: &str) -> PropagandaSignals {
        let prompt = prompts::propaganda_detection(text);
        let outcome = infer_structured(self.generator.as_ref(), &prompt, parse_signals).await;

        let signals = match outcome {
            Ok(Outcome::Valid(signals)) => signals,
            Ok(Outcome::Malformed) => {
                warn!("Propaganda detection output unusable, recording no signals");
                PropagandaSignals::default()
            }
            Err(e) => {
                warn!(error = %e, "Propaganda detection unavailable, recording no signals");
                PropagandaSignals::default()
            }
        };

        info!(
            score = signals.overall_score,
            techniques = signals.techniques.len(),
            "Propaganda detection complete"
        );
        signals
    }
}

/// The overall score key must be present, and only a JSON number counts as a
/// score. A quoted number is malformed output and scores 0.0.
fn parse_signals(value: &Value) -> Option<PropagandaSignals> {
    let score_field = value.get("overall_propaganda_score")?;
    let overall_score = score_field.as_f64().unwrap_or(0.0).clamp(0.0, 1.0);

    let techniques = value
        .get("techniques_detected")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(PropagandaTechnique {
                        technique: item.get("technique")?.as_str()?.to_string(),
                        confidence: item
                            .get("confidence")
                            .and_then(Value::as_f64)
                            .unwrap_or(0.0)
                            .clamp(0.0, 1.0),
                        evidence: item
                            .get("evidence")
                            .and_then(Value::as_str)
                            .unwrap_or("")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(PropagandaSignals {
        techniques,
        overall_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::ScriptedGenerator;

    fn detector(generator: ScriptedGenerator) -> PropagandaDetector {
        PropagandaDetector::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn techniques_and_score_are_parsed() {
        let reply = r#"{
            "techniques_detected": [
                {"technique": "appeal_to_fear", "confidence": 0.85, "evidence": "quote"},
                {"technique": "loaded_language", "confidence": 0.6, "evidence": "words"}
            ],
            "overall_propaganda_score": 0.65
        }"#;
        let signals = detector(ScriptedGenerator::always_ok(reply)).detect("text").await;
        assert_eq!(signals.techniques.len(), 2);
        assert_eq!(signals.techniques[0].technique, "appeal_to_fear");
        assert_eq!(signals.overall_score, 0.65);
    }

    #[tokio::test]
    async fn quoted_score_is_not_a_number() {
        let reply = r#"{"techniques_detected": [], "overall_propaganda_score": "0.93"}"#;
        let signals = detector(ScriptedGenerator::always_ok(reply)).detect("text").await;
        assert_eq!(signals.overall_score, 0.0);
    }

    #[tokio::test]
    async fn out_of_range_score_is_clamped() {
        let reply = r#"{"overall_propaganda_score": 3.7}"#;
        let signals = detector(ScriptedGenerator::always_ok(reply)).detect("text").await;
        assert_eq!(signals.overall_score, 1.0);
    }

    #[tokio::test]
    async fn missing_score_key_degrades_to_default() {
        let reply = r#"{"techniques_detected": []}"#;
        let signals = detector(ScriptedGenerator::always_ok(reply)).detect("text").await;
        assert_eq!(signals.overall_score, 0.0);
        assert!(signals.techniques.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_default() {
        let signals = detector(ScriptedGenerator::always_err("refused")).detect("text").await;
        assert_eq!(signals.overall_score, 0.0);
        assert!(signals.techniques.is_empty());
    }

    #[tokio::test]
    async fn technique_without_name_is_dropped() {
        let reply = r#"{
            "techniques_detected": [{"confidence": 0.9}, {"technique": "bandwagon"}],
            "overall_propaganda_score": 0.2
        }"#;
        let signals = detector(ScriptedGenerator::always_ok(reply)).detect("text").await;
        assert_eq!(signals.techniques.len(), 1);
        assert_eq!(signals.techniques[0].technique, "bandwagon");
        assert_eq!(signals.techniques[0].confidence, 0.0);
    }
}
