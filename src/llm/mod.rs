//! AI scoring collaborators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;

pub use openai::OpenAiChatClient;

/// One chat turn sent to the scorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Opaque completion service. The returned text is expected, not
/// guaranteed, to be JSON.
#[async_trait]
pub trait AiScorer: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> crate::Result<String>;

    fn model_name(&self) -> &str;
}
