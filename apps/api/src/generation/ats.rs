//! ATS scoring output and lenient extraction from model JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured ATS evaluation of a resume against a job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsReport {
    pub score: u8,            // 0 – 100
    pub match_percentage: u8, // 0 – 100
    pub missing_keywords: Vec<String>,
    pub feedback: Vec<String>,
    pub improvement_tips: Vec<String>,
    /// Set when the model output was unusable and this report is empty filler.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl AtsReport {
    /// Builds a report from whatever the model returned. Numbers may arrive as
    /// floats or strings ("85", "85%"); anything missing becomes 0 or empty.
    pub fn from_value(value: &Value) -> Self {
        Self {
            score: percent_field(value, "score"),
            match_percentage: percent_field(value, "match_percentage"),
            missing_keywords: string_list(value, "missing_keywords"),
            feedback: string_list(value, "feedback"),
            improvement_tips: string_list(value, "improvement_tips"),
            degraded: false,
        }
    }
}

fn percent_field(value: &Value, key: &str) -> u8 {
    let raw = match value.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
