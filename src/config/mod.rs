use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the analysis queue
    pub redis_url: String,

    /// Bright Data API key
    pub brightdata_api_key: String,

    /// Bright Data dataset id of the Perplexity scraper
    pub brightdata_dataset_id: String,

    #[serde(default = "default_brightdata_base_url")]
    pub brightdata_base_url: String,

    /// Public base URL the provider calls back on (`<base>/webhook?jobId=...`)
    pub webhook_base_url: String,

    /// API key for the OpenAI-compatible analysis endpoint
    pub openai_api_key: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// RS256 PEM public key for session tokens
    pub auth_jwt_public_key: Option<String>,

    /// HS256 secret for session tokens (used when no public key is set)
    pub auth_jwt_secret: Option<String>,

    /// Jobs waiting on the provider longer than this are failed by the worker
    #[serde(default = "default_scrape_timeout_secs")]
    pub scrape_timeout_secs: u64,

    /// Jobs left in `analyzing` longer than this are failed by the worker
    #[serde(default = "default_analysis_timeout_secs")]
    pub analysis_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_brightdata_base_url() -> String {
    "https://api.brightdata.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_scrape_timeout_secs() -> u64 {
    900
}

fn default_analysis_timeout_secs() -> u64 {
    600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject blank credentials and URLs; they would only fail later per request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("DATABASE_URL", &self.database_url),
            ("REDIS_URL", &self.redis_url),
            ("BRIGHTDATA_API_KEY", &self.brightdata_api_key),
            ("BRIGHTDATA_DATASET_ID", &self.brightdata_dataset_id),
            ("WEBHOOK_BASE_URL", &self.webhook_base_url),
            ("OPENAI_API_KEY", &self.openai_api_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        let has_key = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has_key(&self.auth_jwt_public_key) && !has_key(&self.auth_jwt_secret) {
            return Err(ConfigError::Missing("AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET"));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid auth key: {0}")]
    AuthKey(String),
}
