//! Prompt construction for the scrape and analysis steps.
//!
//! Both builders are pure so a stored `analysis_prompt` can be reproduced from
//! the job's prompt and raw results.

use serde_json::{json, Value};

const MAX_ANSWER_CHARS: usize = 6000;
const MAX_SOURCES_PER_RECORD: usize = 25;

/// Prompt sent to Perplexity through the scrape provider.
pub fn build_scrape_prompt(original_prompt: &str) -> String {
    format!(
        "{}\n\nAnswer thoroughly. Name the specific products, brands and websites you \
         would recommend, and cite the sources you relied on.",
        original_prompt.trim()
    )
}

/// Prompt sent to the analysis model. Each raw record is reduced to the fields
/// the report needs.
pub fn build_analysis_prompt(original_prompt: &str, raw_results: &[Value]) -> String {
    let records: Vec<Value> = raw_results.iter().map(compact_record).collect();
    let records_json =
        serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an SEO analyst. A user asked an AI answer engine the question below.
Study the scraped answers and the sources they cite, then produce an SEO report.

Question: {question}

Scraped answers ({count}):
{records_json}

Respond with a single JSON object and nothing else, using exactly these fields:
{{
  "summary": string,
  "keyInsights": [string],
  "topSources": [{{"domain": string, "url": string | null, "mentions": number}}],
  "keywords": [string],
  "recommendations": [string],
  "contentGaps": [string]
}}"#,
        question = original_prompt.trim(),
        count = records.len(),
    )
}

fn compact_record(record: &Value) -> Value {
    let answer = record
        .get("answer_text")
        .or_else(|| record.get("answer"))
        .and_then(Value::as_str)
        .map(|text| truncate_chars(text, MAX_ANSWER_CHARS));

    json!({
        "answer": answer,
        "sources": source_urls(record.get("sources")),
        "citations": source_urls(record.get("citations")),
    })
}

fn source_urls(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url.clone()),
            Value::Object(map) => map
                .get("url")
                .or_else(|| map.get("link"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .take(MAX_SOURCES_PER_RECORD)
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_prompt_is_deterministic() {
        let a = build_scrape_prompt("best CRM software");
        let b = build_scrape_prompt("  best CRM software ");
        assert_eq!(a, b);
        assert!(a.starts_with("best CRM software"));
    }

    #[test]
    fn test_analysis_prompt_embeds_question_and_sources() {
        let records = vec![json!({
            "answer_text": "HubSpot and Salesforce lead the market.",
            "sources": [{"url": "https://www.g2.com/crm", "title": "G2"}],
            "citations": ["https://hubspot.com"],
            "timestamp": "2025-06-01T00:00:00Z"
        })];
        let prompt = build_analysis_prompt("best CRM software", &records);
        assert!(prompt.contains("Question: best CRM software"));
        assert!(prompt.contains("https://www.g2.com/crm"));
        assert!(prompt.contains("https://hubspot.com"));
        assert!(prompt.contains("Scraped answers (1)"));
        assert!(!prompt.contains("timestamp"));
        assert_eq!(prompt, build_analysis_prompt("best CRM software", &records));
    }

    #[test]
    fn test_long_answers_are_truncated() {
        let long = "a".repeat(MAX_ANSWER_CHARS + 10);
        let compact = compact_record(&json!({ "answer_text": long }));
        let answer = compact["answer"].as_str().unwrap();
        assert_eq!(answer.chars().count(), MAX_ANSWER_CHARS + 1);
    }
}
