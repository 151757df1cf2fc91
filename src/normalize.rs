//! Cleanup of provider output into a typed, all-optional structure.

use serde::Deserialize;
use thiserror::Error;

const FENCE: &str = "```";

#[derive(Debug, Error)]
#[error("malformed provider response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
}

/// Whatever keys the provider returned. Absent and `null` keys are `None`; the
/// orchestrator decides the defaults.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RawGeneration {
    #[serde(default)] pub overview: Option<String>,
    #[serde(default)] pub steps: Option<Vec<String>>,
    #[serde(default)] pub wiring: Option<String>,
    #[serde(default)] pub firmware: Option<String>,
    #[serde(default)] pub parts_needed: Option<Vec<String>>,
    #[serde(default)] pub estimated_cost: Option<String>,
    #[serde(default)] pub where_to_buy: Option<Vec<String>>,
    #[serde(default)] pub tips: Option<Vec<String>>,
}

/// Removes a leading ```` ``` ```` / ```` ```json ```` marker and a trailing ```` ``` ````.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

pub fn normalize(raw_text: &str) -> Result<RawGeneration, MalformedResponse> {
    let cleaned = strip_fences(raw_text);
    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| MalformedResponse { reason: format!("invalid JSON: {e}") })?;
    if !value.is_object() {
        return Err(MalformedResponse { reason: "expected a JSON object".into() });
    }
    serde_json::from_value(value).map_err(|e| MalformedResponse { reason: format!("unexpected field type: {e}") })
}

/// Shortens provider output for log lines.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...[{} chars]", &text[..idx], text.chars().count()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BARE: &str = r#"{"overview":"A blinker","steps":["a","b"],"tips":[]}"#;

    #[test]
    fn fenced_and_bare_parse_identically() {
        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(normalize(&fenced).unwrap(), normalize(BARE).unwrap());

        let untagged = format!("  ```\n{BARE}\n```  \n");
        assert_eq!(normalize(&untagged).unwrap(), normalize(BARE).unwrap());
    }

    #[test]
    fn parses_known_keys() {
        let raw = normalize(BARE).unwrap();
        assert_eq!(raw.overview.as_deref(), Some("A blinker"));
        assert_eq!(raw.steps, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(raw.tips, Some(vec![]));
        assert_eq!(raw.wiring, None);
    }

    #[test]
    fn null_and_unknown_keys_are_tolerated() {
        let raw = normalize(r#"{"overview":null,"extra":{"x":1}}"#).unwrap();
        assert_eq!(raw, RawGeneration::default());
    }

    #[test]
    fn rejects_non_json() {
        let err = normalize("not json at all").unwrap_err();
        assert!(err.reason.starts_with("invalid JSON"));
    }

    #[test]
    fn rejects_non_object_and_wrong_types() {
        assert!(normalize("[1, 2, 3]").is_err());
        assert!(normalize(r#""just a string""#).is_err());
        assert!(normalize(r#"{"steps":"one long string"}"#).is_err());
    }

    #[test]
    fn does_not_repair_trailing_commas() {
        assert!(normalize(r#"```json
{"overview":"x",}
```"#).is_err());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 2), "éé...[5 chars]");
    }
}
