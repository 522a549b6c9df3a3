use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::ChatConfig;
use crate::error::ProviderError;
use crate::traits::ChatProvider;
use crate::types::{ChatRequest, ChatResponse};

#[derive(Clone)]
pub struct OpenAiCompatibleChatProvider {
    config: ChatConfig,
    client: Client,
}

impl OpenAiCompatibleChatProvider {
    pub fn new(config: ChatConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::Config("api key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn payload(&self, request: &ChatRequest) -> Result<Value, ProviderError> {
        if request.messages.is_empty() {
            return Err(ProviderError::Config("chat request has no messages".to_string()));
        }

        let mut payload = Map::new();
        payload.insert(
            "model".to_string(),
            Value::String(self.config.model.clone()),
        );
        payload.insert(
            "messages".to_string(),
            serde_json::to_value(&request.messages)?,
        );
        if let Some(max_tokens) = request.max_tokens {
            payload.insert("max_tokens".to_string(), Value::Number(max_tokens.into()));
        }
        if let Some(temperature) = request.temperature {
            payload.insert("temperature".to_string(), serde_json::to_value(temperature)?);
        }
        Ok(Value::Object(payload))
    }

    fn reply_from(&self, parsed: OpenAiChatResponse) -> Result<ChatResponse, ProviderError> {
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("no message content in response".to_string())
            })?;

        Ok(ChatResponse {
            provider: self.name().to_string(),
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
            content,
            usage_tokens: parsed.usage.and_then(|u| u.total_tokens),
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiCompatibleChatProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let payload = self.payload(&request)?;

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: OpenAiChatResponse = res.json().await?;
        self.reply_from(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn provider() -> OpenAiCompatibleChatProvider {
        let mut cfg = ChatConfig::new("sk-test", "test-model");
        cfg.base_url = "http://localhost:9999/".to_string();
        OpenAiCompatibleChatProvider::new(cfg).expect("provider")
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        assert_eq!(
            provider().endpoint(),
            "http://localhost:9999/v1/chat/completions"
        );
    }

    #[test]
    fn payload_carries_model_and_messages() {
        let mut request = ChatRequest::single("ping");
        request.messages.insert(0, ChatMessage::system("be brief"));
        request.max_tokens = Some(16);

        let payload = provider().payload(&request).expect("payload");
        assert_eq!(payload["model"], "test-model");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "ping");
        assert_eq!(payload["max_tokens"], 16);
        assert!(payload.get("temperature").is_none());
    }

    #[test]
    fn empty_request_is_rejected() {
        let request = ChatRequest {
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
        };
        assert!(matches!(
            provider().payload(&request),
            Err(ProviderError::Config(_))
        ));
    }

    #[test]
    fn first_choice_becomes_reply() {
        let raw = r#"{
            "model": "test-model-2024",
            "choices": [{"message": {"role": "assistant", "content": "pong"}}],
            "usage": {"total_tokens": 12}
        }"#;
        let parsed: OpenAiChatResponse = serde_json::from_str(raw).expect("parse");
        let reply = provider().reply_from(parsed).expect("reply");
        assert_eq!(reply.content, "pong");
        assert_eq!(reply.model, "test-model-2024");
        assert_eq!(reply.usage_tokens, Some(12));
        assert_eq!(reply.provider, "openai-compatible");
    }

    #[test]
    fn missing_choices_is_invalid_response() {
        let parsed: OpenAiChatResponse = serde_json::from_str(r#"{"choices": []}"#).expect("parse");
        assert!(matches!(
            provider().reply_from(parsed),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn empty_api_key_is_config_error() {
        assert!(matches!(
            OpenAiCompatibleChatProvider::new(ChatConfig::new("", "m")),
            Err(ProviderError::Config(_))
        ));
    }
}
