//! Verdict rendering: one inference call per claim over the gathered
//! evidence, then assembly of the investigation record.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use ollama_client::TextGenerator;
use veracity_common::{
    Claim, EvidenceCandidate, InvestigationStatus, NewEvidence, NewInvestigation,
    PropagandaSignals, Stance, Verdict,
};

use crate::inference::{infer_structured, Outcome};
use crate::prompts;

/// Model's judgment on a claim, before evidence bookkeeping.
#[derive(Debug, Clone)]
pub struct VerdictResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub summary: String,
    pub reasoning: String,
}

impl VerdictResult {
    /// Default used when the model never produces a usable verdict.
    fn unverifiable() -> Self {
        Self {
            verdict: Verdict::Unverifiable,
            confidence: 0.0,
            summary: "Unable to determine verdict".to_string(),
            reasoning: "Fact-checking analysis returned no result".to_string(),
        }
    }
}

pub struct FactChecker {
    generator: Arc<dyn TextGenerator>,
}

impl FactChecker {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Judge a claim against its evidence. Malformed model output after
    /// retries degrades to an unverifiable verdict; only transport failure
    /// is an error.
    pub async fn check(
        &self,
        claim: &Claim,
        evidence: &[EvidenceCandidate],
    ) -> Result<VerdictResult> {
        let prompt = prompts::fact_checking(&claim.claim_text, &format_evidence(evidence));
        let outcome = infer_structured(self.generator.as_ref(), &prompt, parse_verdict).await?;

        let result = match outcome {
            Outcome::Valid(result) => result,
            Outcome::Malformed => {
                warn!(claim_id = %claim.id, "Fact-check output unusable, falling back to unverifiable");
                VerdictResult::unverifiable()
            }
        };

        info!(
            claim_id = %claim.id,
            verdict = %result.verdict,
            confidence = result.confidence,
            "Claim fact-checked"
        );
        Ok(result)
    }
}

/// Number the evidence for the prompt; stance is not yet known at this point.
fn format_evidence(evidence: &[EvidenceCandidate]) -> String {
    if evidence.is_empty() {
        return "No evidence found.".to_string();
    }

    evidence
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. Source: {}\n   URL: {}\n   Snippet: {}\n",
                i + 1,
                item.source_name,
                item.source_url,
                item.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The verdict key must be present; every other field is recovered leniently.
fn parse_verdict(value: &Value) -> Option<VerdictResult> {
    let verdict = value.get("verdict")?.as_str()?;
    Some(VerdictResult {
        verdict: Verdict::parse_lenient(verdict),
        confidence: value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        summary: value
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        reasoning: value
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    })
}

/// Label candidates with the verdict-derived stance, producing the rows to
/// persist alongside the investigation.
pub fn label_evidence(candidates: Vec<EvidenceCandidate>, verdict: Verdict) -> Vec<NewEvidence> {
    let stance = Stance::from_verdict(verdict);
    candidates
        .into_iter()
        .map(|c| NewEvidence {
            source_url: c.source_url,
            source_name: c.source_name,
            source_reliability: c.source_reliability,
            snippet: c.snippet,
            context: c.context,
            stance,
            relevance_score: c.relevance_score,
        })
        .collect()
}

/// Assemble the completed investigation: verdict fields from the model,
/// counts and reliability average from the labeled evidence.
pub fn build_investigation(
    claim_id: uuid::Uuid,
    result: VerdictResult,
    evidence: &[NewEvidence],
    propaganda_signals: PropagandaSignals,
) -> NewInvestigation {
    let supporting = evidence.iter().filter(|e| e.stance == Stance::Supporting).count();
    let refuting = evidence.iter().filter(|e| e.stance == Stance::Refuting).count();
    let avg_reliability = if evidence.is_empty() {
        0.0
    } else {
        evidence.iter().map(|e| e.source_reliability).sum::<f64>() / evidence.len() as f64
    };

    NewInvestigation {
        claim_id,
        verdict: result.verdict,
        confidence: result.confidence,
        summary: result.summary,
        reasoning: result.reasoning,
        propaganda_signals,
        source_reliability_avg: avg_reliability,
        evidence_count: evidence.len() as i32,
        supporting_evidence_count: supporting as i32,
        refuting_evidence_count: refuting as i32,
        status: InvestigationStatus::Completed,
    }
}
