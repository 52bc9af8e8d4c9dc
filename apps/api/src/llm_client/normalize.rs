//! Response normalizer: turns raw model text into a JSON value.
//!
//! Models are asked for bare JSON but routinely wrap it in code fences, prefix it
//! with prose, or cut it off mid-object. Normalization never fails: when nothing
//! parseable is found the fixed fallback payload is returned and flagged as
//! `degraded` so callers that care can tell the difference.

use serde_json::{json, Value};
use tracing::warn;

/// Result of normalizing one model response.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub value: Value,
    /// True when `value` is the fallback payload rather than parsed model output.
    pub degraded: bool,
}

/// Generic section advice used when model output cannot be parsed.
pub fn fallback_payload() -> Value {
    json!({
        "suggestions": [
            "Quantify achievements with percentages (e.g., 'Increased efficiency by 20%')",
            "Use strong action verbs like 'Spearheaded', 'Optimized', or 'Architected'",
            "Align keywords directly with the job description requirements"
        ],
        "tips": [
            "Keep this section under 3-4 lines for maximum impact.",
            "Focus on outcomes, not just responsibilities."
        ],
        "improved_content": "A results-driven Professional with expertise in delivering high-impact solutions. Proven ability to optimize workflows and lead cross-functional teams to achieve strategic goals."
    })
}

/// Parses model output into JSON, degrading to `fallback_payload()` on failure.
pub fn normalize(text: &str) -> Normalized {
    match try_normalize(text) {
        Some(value) => Normalized {
            value,
            degraded: false,
        },
        None => {
            warn!(
                "Model output is not parseable JSON, using fallback payload. Raw: {:?}",
                text.chars().take(500).collect::<String>()
            );
            Normalized {
                value: fallback_payload(),
                degraded: true,
            }
        }
    }
}

/// The parsing half of `normalize`, without the fallback.
pub fn try_normalize(text: &str) -> Option<Value> {
    // Already-clean JSON comes back untouched, fence markers inside strings included.
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    let cleaned = strip_json_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Some(value);
    }

    // A model that echoes a pre-filled brace yields `{{...}`: when decoding from one
    // brace fails, try again from the next.
    cleaned
        .match_indices('{')
        .find_map(|(start, _)| value_at(&cleaned[start..]))
}

/// Decodes the JSON value starting at the brace that opens `block`.
fn value_at(block: &str) -> Option<Value> {
    let mut block = block;

    // Small models sometimes emit `{[ {...} ]}`: drop the stray outer brace.
    if block[1..].trim_start().starts_with('[') {
        block = &block[1..];
    }

    match first_json_value(block)? {
        Value::Array(items) if !items.is_empty() => items.into_iter().next(),
        other => Some(other),
    }
}

/// Removes every ```json / ``` marker and trims the result.
fn strip_json_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Decodes the first complete JSON value in `s`, ignoring whatever follows it.
fn first_json_value(s: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(s)
        .into_iter::<Value>()
        .next()?
        .ok()
}
