//! Termination response classification
//!
//! The upstream API is inconsistent about its envelope shape: the same
//! operation may answer with `{"d":[{...}]}` or with a bare `[{...}]`.
//! Both forms are accepted and normalized to a single "first result entry"
//! extraction here, so the rest of the code never type-checks JSON shapes.

use serde_json::Value;

/// Outcome of classifying one termination response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure(String),
}

impl Classification {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Classify a raw response body.
///
/// Success iff the first result entry has `status == "OK"` (case-insensitive)
/// and an empty or absent `message`. Everything else is a failure carrying
/// the entry's message, a generic "Unknown error" when no message exists, or
/// a parse description for unreadable bodies.
#[must_use]
pub fn classify(raw: &str) -> Classification {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Classification::Failure(format!("Invalid response format: {e}")),
    };

    let first = match &value {
        // Normal case: { "d": [ { ... } ] }
        Value::Object(map) => map.get("d").and_then(|d| d.get(0)),
        // Special case: [ { ... } ]
        Value::Array(entries) => entries.first(),
        _ => return Classification::Failure("Unexpected JSON format".to_string()),
    };

    let status = first.and_then(|e| e.get("status")).and_then(Value::as_str);
    let message = first.and_then(|e| e.get("message")).and_then(Value::as_str);

    let status_ok = status.is_some_and(|s| s.eq_ignore_ascii_case("OK"));
    let message_empty = message.map_or(true, str::is_empty);

    if status_ok && message_empty {
        Classification::Success
    } else {
        let reason = match message {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => "Unknown error".to_string(),
        };
        Classification::Failure(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_envelope_with_ok_status_is_success() {
        let body = r#"{"d":[{"status":"OK","message":""}]}"#;
        assert_eq!(classify(body), Classification::Success);
    }

    #[test]
    fn array_envelope_with_ok_status_is_success() {
        let body = r#"[{"status":"OK","message":""}]"#;
        assert_eq!(classify(body), Classification::Success);
    }

    #[test]
    fn status_comparison_is_case_insensitive() {
        let body = r#"{"d":[{"status":"ok"}]}"#;
        assert_eq!(classify(body), Classification::Success);
    }

    #[test]
    fn error_status_carries_message() {
        let body = r#"{"d":[{"status":"Error","message":"bad id"}]}"#;
        assert_eq!(classify(body), Classification::Failure("bad id".to_string()));
    }

    #[test]
    fn ok_status_with_message_is_failure() {
        let body = r#"{"d":[{"status":"OK","message":"partially applied"}]}"#;
        assert_eq!(classify(body), Classification::Failure("partially applied".to_string()));
    }

    #[test]
    fn missing_message_falls_back_to_unknown_error() {
        let body = r#"{"d":[{"status":"Error"}]}"#;
        assert_eq!(classify(body), Classification::Failure("Unknown error".to_string()));
    }

    #[test]
    fn empty_envelope_is_unknown_error() {
        assert_eq!(classify(r#"{"d":[]}"#), Classification::Failure("Unknown error".to_string()));
        assert_eq!(classify(r#"{}"#), Classification::Failure("Unknown error".to_string()));
    }

    #[test]
    fn scalar_body_is_unexpected_format() {
        assert_eq!(
            classify("42"),
            Classification::Failure("Unexpected JSON format".to_string())
        );
    }

    #[test]
    fn unparsable_body_reports_parse_error() {
        let result = classify("<html>gateway timeout</html>");
        match result {
            Classification::Failure(reason) => {
                assert!(reason.starts_with("Invalid response format:"));
            }
            Classification::Success => panic!("expected failure"),
        }
    }
}
