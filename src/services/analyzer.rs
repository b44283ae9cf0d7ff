use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ProviderError;
use crate::models::report::SeoReport;

/// External analysis step turning raw answer records into a report.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(
        &self,
        prompt: &str,
        raw_results: &[serde_json::Value],
    ) -> Result<SeoReport, ProviderError>;
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for OpenAiClient {
    async fn analyze(
        &self,
        prompt: &str,
        raw_results: &[serde_json::Value],
    ) -> Result<SeoReport, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": "You produce SEO reports as strict JSON."
                },
                { "role": "user", "content": prompt }
            ]
        });

        tracing::debug!(model = %self.model, records = raw_results.len(), "Requesting analysis");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("response has no message content".into()))?;

        parse_report(&content)
    }
}

/// Parse model output into a report, tolerating a fenced code block.
pub fn parse_report(content: &str) -> Result<SeoReport, ProviderError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(json).map_err(|e| ProviderError::Malformed(e.to_string()))
}
