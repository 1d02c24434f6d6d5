//! Chat model abstraction.
//!
//! The pipeline only talks to [`LlmClient`]; [`OpenAiLlm`] is the production
//! implementation for any OpenAI-compatible endpoint.

mod openai;

pub use openai::{is_rate_limited, OpenAiLlm};

use crate::error::{BlogError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// How the model should shape its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Text,
    /// Ask for a single JSON object.
    Json,
}

/// Raw model output.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub content: Option<String>,
    /// Model that actually answered, which differs from the configured one after a fallback.
    pub model: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke_with(&self, messages: &[ChatMessage], mode: ResponseMode) -> Result<LlmResponse>;

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        self.invoke_with(messages, ResponseMode::Text).await
    }
}

/// Extract the text payload of a response.
pub fn response_text(response: &LlmResponse) -> Result<String> {
    response
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| BlogError::Llm("Empty response from LLM".to_string()))
}

/// Invoke in JSON mode and parse the answer into `T`.
pub async fn invoke_structured<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    messages: &[ChatMessage],
) -> Result<T> {
    let response = llm.invoke_with(messages, ResponseMode::Json).await?;
    let text = response_text(&response)?;
    parse_json_object(&text)
}

fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T> {
    // Models sometimes wrap the object in prose or code fences
    let json = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    };

    serde_json::from_str(json).map_err(|e| {
        BlogError::Llm(format!(
            "Failed to parse structured response: {}. Response was: {}",
            e,
            text.chars().take(500).collect::<String>()
        ))
    })
}
