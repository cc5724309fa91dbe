use sha2::{Digest, Sha256};
use tracing::debug;

use crate::redact::redact_pii;

/// Output of content normalization: the redacted text plus its fingerprint.
#[derive(Debug, Clone)]
pub struct NormalizedContent {
    pub text: String,
    /// Lowercase hex SHA-256 of the redacted text. Empty content hashes to
    /// the empty string. Reserved for cross-URL dedup; URL is the dedup key.
    pub fingerprint: String,
    pub pii_redactions: usize,
}

/// Redact PII from raw feed-entry content and fingerprint the result.
pub fn normalize_content(raw: &str) -> NormalizedContent {
    let (text, pii_redactions) = redact_pii(raw);
    if pii_redactions > 0 {
        debug!(pii_redactions, "Redacted PII entities from article content");
    }

    let fingerprint = content_fingerprint(&text);

    NormalizedContent {
        text,
        fingerprint,
        pii_redactions,
    }
}

fn content_fingerprint(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = normalize_content("The senate voted 52-48.");
        let b = normalize_content("The senate voted 52-48.");
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_of_empty_content_is_empty() {
        assert_eq!(normalize_content("").fingerprint, "");
    }

    #[test]
    fn test_fingerprint_covers_redacted_text() {
        // Two inputs that redact to the same text must fingerprint identically.
        let a = normalize_content("Reach us at 612-555-1234 for comment.");
        let b = normalize_content("Reach us at 651-555-9876 for comment.");
        assert_eq!(a.text, b.text);
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_redaction_count_surfaces() {
        let n = normalize_content("Email tips@paper.com or call 612-555-1234");
        assert_eq!(n.pii_redactions, 2);
    }
}
