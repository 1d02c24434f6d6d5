//! OpenAI-compatible chat completions with a rate-limit fallback model.

use super::{ChatMessage, LlmClient, LlmResponse, ResponseMode, Role};
use crate::config::LlmSettings;
use crate::error::{BlogError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "429", "tokens per day", "tpd", "limit reached"];

/// Whether an LLM error message looks like quota exhaustion.
pub fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Chat client for Groq or any other OpenAI-compatible endpoint.
pub struct OpenAiLlm {
    client: Client<OpenAIConfig>,
    model: String,
    fallback_model: Option<String>,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: create_client(settings, api_key)?,
            model: settings.model.clone(),
            fallback_model: settings
                .has_fallback()
                .then(|| settings.fallback_model.clone()),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_request_messages(messages: &[ChatMessage]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages
            .iter()
            .map(|m| {
                let message: ChatCompletionRequestMessage = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| BlogError::Llm(e.to_string()))?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| BlogError::Llm(e.to_string()))?
                        .into(),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map_err(|e| BlogError::Llm(e.to_string()))?
                        .into(),
                };
                Ok(message)
            })
            .collect()
    }

    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        mode: ResponseMode,
    ) -> Result<LlmResponse> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(messages)
            .temperature(self.temperature);
        if mode == ResponseMode::Json {
            args.response_format(ResponseFormat::JsonObject);
        }
        let request = args.build().map_err(|e| BlogError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BlogError::Llm(format!("Failed to generate response: {}", e)))?;

        Ok(LlmResponse {
            content: response
                .choices
                .first()
                .and_then(|c| c.message.content.clone()),
            model: response.model,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiLlm {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn invoke_with(&self, messages: &[ChatMessage], mode: ResponseMode) -> Result<LlmResponse> {
        let request = Self::to_request_messages(messages)?;

        match self.complete(&self.model, request.clone(), mode).await {
            Ok(response) => {
                debug!("Completion from {}", response.model);
                Ok(response)
            }
            Err(e) => match &self.fallback_model {
                Some(fallback) if is_rate_limited(&e.to_string()) => {
                    warn!("{} is rate limited, switching to {}", self.model, fallback);
                    self.complete(fallback, request, mode).await
                }
                _ => Err(e),
            },
        }
    }
}
