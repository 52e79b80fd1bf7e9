//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, LINE ids and phone numbers from upstream
//! error bodies before they reach a log line or a user.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
/// LINE user, group and room ids: a type letter followed by 32 hex digits.
static LINE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[UCR][0-9a-f]{32}\b").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{3,4}[-.\s]?\d{4}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = LINE_ID_RE.replace_all(&redacted, "[REDACTED_ID]");
    PHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_bearer_tokens() {
        let raw = "request failed with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert_eq!(clean, "request failed with [REDACTED_TOKEN]");
    }

    #[test]
    fn redacts_openai_style_keys() {
        let raw = r#"{"error":{"message":"Incorrect API key provided: sk-proj-abcdefghijklmnopqrstuvwxyz"}}"#;
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("abcdefghijklmnop"), "{clean}");
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn redacts_line_ids_and_phones() {
        let raw = "The property, 'to' U4af4980629a0c4e1a2b3c4d5e6f7a8b9 is invalid; call +81-90-1234-5678";
        let clean = redact_sensitive_data(raw);
        assert_eq!(
            clean,
            "The property, 'to' [REDACTED_ID] is invalid; call [REDACTED_PHONE]"
        );
    }

    #[test]
    fn leaves_plain_errors_alone() {
        let raw = r#"{"message":"Invalid reply token","details":[{"property":"messages[0].text"}]}"#;
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
