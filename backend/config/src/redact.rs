//! Config redaction: masks secrets before a config is printed or logged.

use serde_json::Value;

/// Keys whose string values are secrets.
static SECRET_KEYS: &[&str] = &["token", "botToken", "apiKey", "secret", "password"];

/// Redact a config JSON value, replacing every secret with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    // Keep the first 4 chars as a hint
    let hint: String = s.chars().take(4).collect();
    if s.chars().count() > 8 {
        Value::String(format!("{hint}***"))
    } else {
        Value::String("***".to_string())
    }
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
    fn redacts_bot_token() {
        let v = json!({ "telegram": { "token": "1234567890:ABCDEFGHIJKLMNOP" } });
        let token = redact(&v)["telegram"]["token"].as_str().unwrap().to_string();
        assert_eq!(token, "1234***");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        let v = json!({ "telegram": { "token": "abc" } });
        assert_eq!(redact(&v)["telegram"]["token"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "logging": { "level": "debug" }, "limits": { "workerThreads": 4 } });
        let redacted = redact(&v);
        assert_eq!(redacted, v);
    }
}
