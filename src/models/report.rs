use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Structured SEO report produced by the analysis step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub summary: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub top_sources: Vec<SourceMention>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub content_gaps: Vec<String>,
}

/// A domain the AI answer cited, with how often it appeared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceMention {
    pub domain: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub mentions: u32,
}

/// Model output is loose with numbers: accept floats, numeric strings and
/// negatives (clamped to zero) instead of rejecting the whole report.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let n = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, u32::MAX as f64) as u32)
        .unwrap_or(0))
}
