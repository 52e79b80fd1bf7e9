//! Config redaction: produce safe-to-print config snapshots by masking secrets.

use serde_json::Value;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "channelSecret",
    "channel_secret",
    "channelAccessToken",
    "channel_access_token",
    "accessToken",
    "access_token",
    "token",
    "secret",
    "password",
];

/// Redact a config JSON value, keeping a four character hint of each secret.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    let hint = if s.chars().count() > 8 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    };
    Value::String(hint)
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_line_credentials_and_api_key() {
        let v = json!({
            "line": { "channelSecret": "0123456789abcdef", "channelAccessToken": "short" },
            "chat": { "apiKey": "sk-abcdef123456", "model": "gpt-3.5-turbo" }
        });
        let redacted = redact(&v);
        assert_eq!(redacted["line"]["channelSecret"], "0123***");
        assert_eq!(redacted["line"]["channelAccessToken"], "***");
        assert_eq!(redacted["chat"]["apiKey"], "sk-a***");
        assert_eq!(redacted["chat"]["model"], "gpt-3.5-turbo");
    }
}
