//! Parsing of oracle responses.
//!
//! The oracle is untrusted: answers may come wrapped in markdown fences, carry
//! a sentence of prose, or be structurally wrong. Everything here turns such
//! answers into typed values or a descriptive error, never a panic.

use serde_json::Value;
use thiserror::Error;

use crate::error::{PipelineError, Result};
use crate::models::{ClauseStatus, ExtractedClause};

/// Why an enumeration answer was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnumerationIssue {
    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("expected a JSON array, got {0}")]
    NotAnArray(String),

    #[error("empty list")]
    Empty,

    #[error("non-integer values: {0}")]
    NonInteger(String),

    #[error("not monotonically increasing or has duplicates: {0:?}")]
    NotStrictlyIncreasing(Vec<u32>),
}

/// Extract the JSON payload from an oracle answer.
///
/// When fenced blocks exist, prefers the one starting with `opening`
/// (`[` or `{`), otherwise the last one. Without fences, trims any prose
/// around the outermost `opening`..closing pair.
pub fn extract_json_payload(response: &str, opening: char) -> String {
    let trimmed = response.trim();
    let closing = if opening == '[' { ']' } else { '}' };

    let blocks = extract_fenced_blocks(trimmed);
    if let Some(block) = blocks
        .iter()
        .find(|b| b.trim_start().starts_with(opening))
        .or_else(|| blocks.last())
    {
        return block.trim().to_string();
    }

    // An unterminated fence: drop the opening line.
    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => rest.split_once('\n').map_or("", |(_, body)| body).trim(),
        None => trimmed,
    };

    if unfenced.starts_with(opening) {
        return unfenced.to_string();
    }

    match (unfenced.find(opening), unfenced.rfind(closing)) {
        (Some(start), Some(end)) if start < end => unfenced[start..=end].to_string(),
        _ => unfenced.to_string(),
    }
}

/// Extract all fenced code blocks from text.
fn extract_fenced_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find("```") {
        let after_fence = &remaining[start + 3..];
        // Skip optional language identifier on the same line
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            blocks.push(content[..end].to_string());
            remaining = &content[end + 3..];
        } else {
            break;
        }
    }

    blocks
}

/// Validate an enumeration answer: a non-empty, strictly increasing array of
/// non-negative integers.
pub fn validate_clause_numbers(value: &Value) -> std::result::Result<Vec<u32>, EnumerationIssue> {
    let Value::Array(items) = value else {
        return Err(EnumerationIssue::NotAnArray(json_kind(value).to_string()));
    };

    if items.is_empty() {
        return Err(EnumerationIssue::Empty);
    }

    let numbers: Option<Vec<u32>> = items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u32::try_from(n).ok()))
        .collect();
    let Some(numbers) = numbers else {
        return Err(EnumerationIssue::NonInteger(value.to_string()));
    };

    if numbers.windows(2).any(|w| w[0] >= w[1]) {
        return Err(EnumerationIssue::NotStrictlyIncreasing(numbers));
    }

    Ok(numbers)
}

/// Parse and validate the oracle's enumeration answer.
pub fn parse_clause_numbers(response: &str) -> std::result::Result<Vec<u32>, EnumerationIssue> {
    let payload = extract_json_payload(response, '[');
    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| EnumerationIssue::Malformed(e.to_string()))?;
    validate_clause_numbers(&value)
}

/// Parse the oracle's extraction answer into a clause record.
pub fn parse_clause_record(response: &str) -> Result<ExtractedClause> {
    let payload = extract_json_payload(response, '{');
    let value: Value = serde_json::from_str(&payload)
        .map_err(|e| PipelineError::LlmResponseParse(format!("clause record: {e}")))?;

    if !value.is_object() {
        return Err(PipelineError::LlmResponseParse(format!(
            "clause record: expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    Ok(ExtractedClause {
        number: field(&value, "number").cloned(),
        title: field(&value, "title").and_then(Value::as_str).unwrap_or_default().to_string(),
        text: ["text", "body", "agreed_text"]
            .iter()
            .filter_map(|name| field(&value, name).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .unwrap_or_default()
            .to_string(),
        sub_parts: string_list(field(&value, "sub_parts")),
        status: field(&value, "status")
            .and_then(Value::as_str)
            .map(|s| ClauseStatus::from(s.to_string())),
        references: string_list(field(&value, "references")),
    })
}

/// A non-null field of a JSON object.
fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

/// Strings and numbers from a JSON array, as strings. Anything else is skipped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
