//! Parse LLM output into link candidates
//!
//! Accepted shapes, after stripping any markdown fence:
//!
//! - `{"links": [...]}`
//! - a bare array of candidates
//! - `{"has_interpretation": false}`, meaning no links
//! - a single candidate object, optionally with `"has_interpretation": true`
//!
//! Anything that is not JSON is an error so the caller can retry. Individual
//! malformed candidates are skipped.

use crate::error::ExtractorError;
use crate::types::LlmLinkCandidate;
use serde_json::Value;
use tracing::warn;

/// Parse LLM JSON response into link candidates
pub fn parse_llm_response(response: &str) -> Result<Vec<LlmLinkCandidate>, ExtractorError> {
    // LLMs sometimes wrap JSON in markdown code blocks or prose
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractorError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    let items = match json {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            if let Some(links) = obj.remove("links") {
                match links {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    _ => {
                        return Err(ExtractorError::InvalidFormat(
                            "'links' must be an array".to_string(),
                        ))
                    }
                }
            } else if obj.get("has_interpretation").and_then(Value::as_bool) == Some(false) {
                Vec::new()
            } else if obj.contains_key("statute_name") {
                vec![Value::Object(obj)]
            } else {
                return Err(ExtractorError::InvalidFormat(
                    "Expected a 'links' array".to_string(),
                ));
            }
        }
        _ => {
            return Err(ExtractorError::InvalidFormat(
                "Expected JSON object or array".to_string(),
            ))
        }
    };

    let mut candidates = Vec::new();
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<LlmLinkCandidate>(item) {
            Ok(candidate) => {
                if let Err(e) = candidate.validate() {
                    warn!("Candidate {} failed validation: {}", idx, e);
                    continue;
                }
                candidates.push(candidate);
            }
            Err(e) => {
                warn!("Failed to parse candidate {}: {}", idx, e);
            }
        }
    }

    Ok(candidates)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<&str, ExtractorError> {
    let mut trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the fence line (```json or ```) and the closing fence
        let body = rest
            .split_once('\n')
            .map(|(_, body)| body)
            .ok_or_else(|| ExtractorError::InvalidFormat("Empty code block".to_string()))?;
        trimmed = body.trim_end().trim_end_matches("```").trim();
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    // Prose around the payload: take the outermost object or array
    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(ExtractorError::InvalidFormat(
            "No JSON found in response".to_string(),
        )),
    }
}
