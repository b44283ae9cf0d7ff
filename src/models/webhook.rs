use serde::Deserialize;
use serde_json::Value;

/// Body of a Bright Data delivery notification.
///
/// The provider posts either the bare record array or an envelope. Any job
/// identifier inside the body is ignored; correlation uses the callback URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookPayload {
    Records(Vec<Value>),
    Envelope(WebhookEnvelope),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default, alias = "data")]
    pub results: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// What a delivery means for the job.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    Succeeded(Vec<Value>),
    Failed(String),
}

impl WebhookPayload {
    pub fn into_outcome(self) -> ScrapeOutcome {
        let records = match self {
            WebhookPayload::Records(records) => records,
            WebhookPayload::Envelope(envelope) => {
                if let Some(error) = envelope.error.as_ref().and_then(error_text) {
                    return ScrapeOutcome::Failed(error);
                }
                if envelope.status.as_deref() == Some("failed") {
                    return ScrapeOutcome::Failed("provider reported scrape failure".to_string());
                }
                envelope.results.unwrap_or_default()
            }
        };

        let first_error = records
            .iter()
            .find_map(|r| r.get("error").and_then(error_text));
        let usable: Vec<Value> = records
            .into_iter()
            .filter(|r| r.get("error").and_then(error_text).is_none())
            .collect();

        if usable.is_empty() {
            ScrapeOutcome::Failed(
                first_error.unwrap_or_else(|| "provider returned no results".to_string()),
            )
        } else {
            ScrapeOutcome::Succeeded(usable)
        }
    }
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}
