//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::{BlogError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint with the given key and request timeout.
pub fn create_client(settings: &LlmSettings, api_key: &str) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(settings, api_key, Duration::from_secs(settings.timeout_secs))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    settings: &LlmSettings,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BlogError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    // Rate limits surface immediately so callers can switch models
    let no_retry = backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build();

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry))
}
