use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{AiScorer, ChatMessage};
use crate::TravelRankError;
use crate::config::AiConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

impl ChatResponse {
    /// First choice content, or an empty JSON object when there is none
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| "{}".to_string())
    }
}

/// OpenAI-compatible chat completions client in JSON mode
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiChatClient {
    pub fn new(config: &AiConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| TravelRankError::config("AI API key is not configured"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| TravelRankError::config(format!("Failed to create HTTP client: {e}")))?;

        info!("OpenAI chat client initialized (model={})", config.model);
        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl AiScorer for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => TravelRankError::config("AI service rejected the configured API key"),
                _ => TravelRankError::transport(format!("AI service error {status}: {body}")),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TravelRankError::malformed(format!("Invalid completion envelope: {e}")))?;

        if let Some(usage) = &parsed.usage {
            debug!(tokens = usage.total_tokens, "AI completion usage");
        }
        Ok(parsed.into_content())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = [ChatMessage::system("rules"), ChatMessage::user("places")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.2,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "places");
    }

    #[test]
    fn test_content_extraction() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"picked\": []}"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_content(), r#"{"picked": []}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.into_content(), "{}");

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert_eq!(null_content.into_content(), "{}");
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = OpenAiChatClient::new(&AiConfig::default()).err().unwrap();
        assert!(matches!(err, TravelRankError::Config { .. }));
    }

    #[test]
    fn test_completions_url() {
        let config = AiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "https://api.openai.com/".to_string(),
            ..AiConfig::default()
        };
        let client = OpenAiChatClient::new(&config).unwrap();
        assert_eq!(
            client.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }
}
