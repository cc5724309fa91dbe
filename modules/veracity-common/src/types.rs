use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Status enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Pending,
    Processing,
    Processed,
    Error,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "pending",
            ArticleStatus::Processing => "processing",
            ArticleStatus::Processed => "processed",
            ArticleStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ArticleStatus::Pending),
            "processing" => Some(ArticleStatus::Processing),
            "processed" => Some(ArticleStatus::Processed),
            "error" => Some(ArticleStatus::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Checking,
    Verified,
    Error,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Checking => "checking",
            ClaimStatus::Verified => "verified",
            ClaimStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ClaimStatus::Pending),
            "checking" => Some(ClaimStatus::Checking),
            "verified" => Some(ClaimStatus::Verified),
            "error" => Some(ClaimStatus::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    InProgress,
    Completed,
    Error,
}

impl InvestigationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestigationStatus::InProgress => "in_progress",
            InvestigationStatus::Completed => "completed",
            InvestigationStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(InvestigationStatus::InProgress),
            "completed" => Some(InvestigationStatus::Completed),
            "error" => Some(InvestigationStatus::Error),
            _ => None,
        }
    }
}

// --- Domain enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Factual,
    Statistic,
    Quote,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Factual => "factual",
            ClaimType::Statistic => "statistic",
            ClaimType::Quote => "quote",
        }
    }

    /// Unknown type tags from the model fall back to `factual`.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "statistic" => ClaimType::Statistic,
            "quote" => ClaimType::Quote,
            _ => ClaimType::Factual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    MostlyTrue,
    Mixed,
    MostlyFalse,
    False,
    Unverifiable,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::MostlyTrue => "mostly_true",
            Verdict::Mixed => "mixed",
            Verdict::MostlyFalse => "mostly_false",
            Verdict::False => "false",
            Verdict::Unverifiable => "unverifiable",
        }
    }

    /// Unknown verdict strings from the model fall back to `unverifiable`.
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "true" => Verdict::True,
            "mostly_true" => Verdict::MostlyTrue,
            "mixed" => Verdict::Mixed,
            "mostly_false" => Verdict::MostlyFalse,
            "false" => Verdict::False,
            _ => Verdict::Unverifiable,
        }
    }

    pub const ALL: [Verdict; 6] = [
        Verdict::True,
        Verdict::MostlyTrue,
        Verdict::Mixed,
        Verdict::MostlyFalse,
        Verdict::False,
        Verdict::Unverifiable,
    ];
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Supporting,
    Refuting,
    Neutral,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Supporting => "supporting",
            Stance::Refuting => "refuting",
            Stance::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supporting" => Some(Stance::Supporting),
            "refuting" => Some(Stance::Refuting),
            "neutral" => Some(Stance::Neutral),
            _ => None,
        }
    }

    /// Stance is derived from the investigation's verdict, not classified per
    /// evidence item. Known simplification: a true verdict labels all retained
    /// evidence as supporting it.
    pub fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::True | Verdict::MostlyTrue => Stance::Supporting,
            Verdict::False | Verdict::MostlyFalse => Stance::Refuting,
            Verdict::Mixed | Verdict::Unverifiable => Stance::Neutral,
        }
    }
}

// --- Entities ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub reliability_score: f64,
    pub active: bool,
    pub fetch_interval_minutes: i32,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub source_id: Uuid,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// PII-redacted article text.
    pub content: String,
    /// SHA-256 of the redacted content. Reserved for cross-URL dedup;
    /// URL is the uniqueness key.
    pub content_hash: String,
    pub influence_score: f64,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
}

/// Article fields known at ingestion time, before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: Uuid,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: String,
    pub content_hash: String,
    pub influence_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub article_id: Uuid,
    pub claim_text: String,
    pub claim_type: ClaimType,
    pub context: String,
    pub is_checkable: bool,
    pub extraction_confidence: f64,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClaim {
    pub article_id: Uuid,
    pub claim_text: String,
    pub claim_type: ClaimType,
    pub context: String,
    pub is_checkable: bool,
    pub extraction_confidence: f64,
}

impl NewClaim {
    /// Checkability is derived once from extraction confidence and never
    /// independently mutated afterwards.
    pub fn new(
        article_id: Uuid,
        claim_text: String,
        claim_type: ClaimType,
        context: String,
        extraction_confidence: f64,
    ) -> Self {
        Self {
            article_id,
            claim_text,
            claim_type,
            context,
            is_checkable: extraction_confidence > 0.5,
            extraction_confidence,
        }
    }
}

/// Propaganda techniques detected in a claim, with the aggregate score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropagandaSignals {
    #[serde(default)]
    pub techniques: Vec<PropagandaTechnique>,
    #[serde(default)]
    pub overall_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagandaTechnique {
    pub technique: String,
    pub confidence: f64,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigation {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub verdict: Verdict,
    pub confidence: f64,
    pub summary: String,
    pub reasoning: String,
    pub propaganda_signals: PropagandaSignals,
    pub source_reliability_avg: f64,
    pub evidence_count: i32,
    pub supporting_evidence_count: i32,
    pub refuting_evidence_count: i32,
    pub status: InvestigationStatus,
    pub created_at: DateTime<Utc>,
}

/// Investigation fields produced by the fact checker, before the store
/// assigns identity. Always inserted as a new row: completed investigations
/// are never mutated, corrective re-processing creates a fresh one.
#[derive(Debug, Clone)]
pub struct NewInvestigation {
    pub claim_id: Uuid,
    pub verdict: Verdict,
    pub confidence: f64,
    pub summary: String,
    pub reasoning: String,
    pub propaganda_signals: PropagandaSignals,
    pub source_reliability_avg: f64,
    pub evidence_count: i32,
    pub supporting_evidence_count: i32,
    pub refuting_evidence_count: i32,
    pub status: InvestigationStatus,
}

#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub source_url: String,
    pub source_name: String,
    pub source_reliability: f64,
    pub snippet: String,
    pub context: String,
    pub stance: Stance,
    pub relevance_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub investigation_id: Uuid,
    pub source_url: String,
    pub source_name: String,
    pub source_reliability: f64,
    pub snippet: String,
    pub context: String,
    pub stance: Stance,
    pub relevance_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Evidence fields produced by the searcher, before stance assignment and
/// persistence.
#[derive(Debug, Clone)]
pub struct EvidenceCandidate {
    pub article_id: Uuid,
    pub source_url: String,
    pub source_name: String,
    pub source_reliability: f64,
    pub snippet: String,
    pub context: String,
    pub relevance_score: f64,
}
