use std::time::Duration;

use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env_string("BIZSCORE_CHAT_API_KEY").ok_or_else(|| {
            ProviderError::Config("BIZSCORE_CHAT_API_KEY is not set".to_string())
        })?;
        let model = env_string("BIZSCORE_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mut cfg = Self::new(api_key, model);
        if let Some(base_url) = env_string("BIZSCORE_CHAT_BASE_URL") {
            cfg.base_url = base_url;
        }
        if let Some(secs) =
            env_string("BIZSCORE_CHAT_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            cfg.timeout = Duration::from_secs(secs.clamp(1, 300));
        }
        Ok(cfg)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
