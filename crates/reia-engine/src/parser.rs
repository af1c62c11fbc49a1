use serde_json::Value;
use tracing::warn;

/// Number of characters of an unparseable reply kept in the log.
const PREVIEW_CHARS: usize = 200;

/// Recover the first JSON object from a model reply that may contain
/// surrounding prose.
///
/// Tried in order:
/// - the whole reply: `{"key": "value"}`
/// - a fenced block: ```json\n{"key": "value"}\n```
/// - brace-balanced spans: `Here is the analysis:\n{"key": "value"}`
///
/// Returns `None` when nothing parses; this is an expected outcome, not an error.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    if let Some(value) = parse_object(trimmed) {
        return Some(value);
    }

    if let Some(value) = fenced_blocks(trimmed).find_map(parse_object) {
        return Some(value);
    }

    if let Some(value) = balanced_objects(trimmed).find_map(parse_object) {
        return Some(value);
    }

    let preview: String = text.chars().take(PREVIEW_CHARS).collect();
    warn!(length = text.len(), preview = %preview, "Could not extract JSON from model reply");
    None
}

fn parse_object(candidate: &str) -> Option<Value> {
    if !candidate.starts_with('{') {
        return None;
    }
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Contents of each ``` fenced block, with a leading `json` tag removed.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let open = rest.find("```")?;
        let after = &rest[open + 3..];
        let close = after.find("```")?;
        let block = &after[..close];
        rest = &after[close + 3..];

        let body = block.trim_start();
        let body = match body.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
            _ => body,
        };
        Some(body.trim())
    })
}

/// Brace-balanced `{ ... }` spans, in order of their opening brace. Braces
/// inside string literals are ignored.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> {
    let mut offset = 0;
    std::iter::from_fn(move || loop {
        let start = offset + text[offset..].find('{')?;
        offset = start + 1;
        if let Some(len) = balanced_len(&text[start..]) {
            return Some(&text[start..start + len]);
        }
    })
}

/// Byte length of the balanced object opening at the start of `text`.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// One per-property entry of the model's `analysis` array.
#[derive(Debug, Clone, PartialEq)]
pub struct AiRecommendation {
    pub property_id: String,
    pub noi: Option<f64>,
    pub cap_rate: Option<f64>,
    pub score: Option<f64>,
    pub recommendation: String,
}

/// Read the `analysis` entries out of an extracted reply. Entries without a
/// property id are dropped; a missing `analysis` key yields an empty list.
pub fn parse_recommendations(value: &Value) -> Vec<AiRecommendation> {
    let Some(items) = value.get("analysis").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let property_id = match item.get("property_id")? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(AiRecommendation {
                property_id,
                noi: number(item.get("noi")),
                cap_rate: number(item.get("cap_rate")),
                score: number(item.get("score")),
                recommendation: item
                    .get("recommendation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            })
        })
        .collect()
}

/// A finite number, given either as a JSON number or a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_clean_json() {
        let input = r#"{"confidence": 0.75, "reasoning": "test"}"#;
        let result = extract_json(input).unwrap();
        assert_eq!(result["confidence"], 0.75);
    }

    #[test]
    fn extract_from_markdown() {
        let input = "Here is my analysis:\n```json\n{\"analysis\": []}\n```\nDone.";
        let result = extract_json(input).unwrap();
        assert!(result["analysis"].is_array());
    }

    #[test]
    fn extract_from_markdown_no_lang() {
        let input = "Result:\n```\n{\"score\": 81}\n```";
        assert_eq!(extract_json(input).unwrap()["score"], 81);
    }

    #[test]
    fn skips_non_json_fenced_blocks() {
        let input = "```python\nprint('hi')\n```\nand\n```JSON\n{\"ok\": true}\n```";
        assert_eq!(extract_json(input).unwrap()["ok"], true);
    }

    #[test]
    fn extract_with_prefix_text() {
        let input = "Based on my analysis, here is the result:\n{\"analysis\": [{\"property_id\": \"P1\"}]} Hope this helps!";
        let result = extract_json(input).unwrap();
        assert_eq!(result["analysis"][0]["property_id"], "P1");
    }

    #[test]
    fn later_span_used_when_first_is_not_json() {
        let input = "Use the {id} placeholder. Output: {\"analysis\": []}";
        assert!(extract_json(input).unwrap()["analysis"].is_array());
    }

    #[test]
    fn braces_inside_strings() {
        let input = r#"note: {"reasoning": "went from {low} to {high}", "score": 50}"#;
        assert_eq!(extract_json(input).unwrap()["score"], 50);
    }

    #[test]
    fn quotes_in_prose_do_not_confuse_scan() {
        let input = "The model said \"ok {\" then: {\"score\": 1}";
        assert_eq!(extract_json(input).unwrap()["score"], 1);
    }

    #[test]
    fn plain_prose_is_absent() {
        let input = "PROP003 looks strongest; I would buy it and pass on the rest.";
        assert!(extract_json(input).is_none());
    }

    #[test]
    fn top_level_array_is_not_an_object() {
        assert!(extract_json("[1, 2, 3]").is_none());
    }

    #[test]
    fn unbalanced_braces_are_absent() {
        assert!(extract_json("{\"analysis\": [").is_none());
    }

    #[test]
    fn parse_recommendations_leniently() {
        let value = serde_json::json!({
            "analysis": [
                {"property_id": "PROP001", "noi": 45000, "cap_rate": "9.0%", "score": 88, "recommendation": " Buy "},
                {"property_id": 2, "score": "71.5", "recommendation": "Hold"},
                {"score": 50, "recommendation": "no id"},
                {"property_id": "PROP004", "score": "n/a"}
            ]
        });

        let recs = parse_recommendations(&value);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].property_id, "PROP001");
        assert_eq!(recs[0].cap_rate, Some(9.0));
        assert_eq!(recs[0].score, Some(88.0));
        assert_eq!(recs[0].recommendation, "Buy");
        assert_eq!(recs[1].property_id, "2");
        assert_eq!(recs[1].score, Some(71.5));
        assert_eq!(recs[2].score, None);
        assert!(recs[2].recommendation.is_empty());
    }

    #[test]
    fn missing_analysis_key_is_empty() {
        assert!(parse_recommendations(&serde_json::json!({"result": []})).is_empty());
    }
}
