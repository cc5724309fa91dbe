use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap());
static SSN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,5}\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:St|Ave|Blvd|Dr|Ln|Rd|Way|Ct|Pl|Cir|Ter)\b").unwrap()
});

/// Replace PII patterns with typed placeholders. Returns the redacted text
/// and how many substitutions were made. Best-effort by construction: a pure
/// local transform that passes unmatched text through unchanged, so ingestion
/// never blocks on redaction.
pub fn redact_pii(text: &str) -> (String, usize) {
    let mut redacted = text.to_string();
    let mut count = 0;

    // SSN before phone: the SSN pattern is a subset of loose phone formats.
    for (re, placeholder) in [
        (&*SSN_RE, "[SSN]"),
        (&*PHONE_RE, "[PHONE]"),
        (&*EMAIL_RE, "[EMAIL]"),
        (&*ADDRESS_RE, "[ADDRESS]"),
    ] {
        count += re.find_iter(&redacted).count();
        redacted = re.replace_all(&redacted, placeholder).into_owned();
    }

    (redacted, count)
}
