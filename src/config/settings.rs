//! Configuration settings for blogsmith.

use crate::transcript::StrategyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub transcript: TranscriptSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model settings. Any OpenAI-compatible endpoint works; Groq is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    /// API key. Usually supplied through `GROQ_API_KEY` instead.
    pub api_key: Option<String>,
    pub model: String,
    /// Model used when the primary model is rate limited. Empty disables the switch.
    pub fallback_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "openai/gpt-oss-120b".to_string(),
            fallback_model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    pub fn has_fallback(&self) -> bool {
        !self.fallback_model.is_empty() && self.fallback_model != self.model
    }
}

/// Transcript extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption languages, in priority order.
    pub languages: Vec<String>,
    /// Accept a caption track in any language when none of `languages` match.
    pub allow_any_language: bool,
    /// Strategies to try, in order.
    pub strategies: Vec<StrategyKind>,
    /// Attempts per strategy for transient failures.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    /// Per-request timeout, clamped to 10..=30 seconds.
    pub http_timeout_secs: u64,
    /// Deadline for the whole chain. 0 disables it.
    pub overall_timeout_secs: u64,
    /// Stop trying further strategies once YouTube blocks this IP.
    pub skip_after_ip_block: bool,
    pub user_agent: String,
    pub ytdlp_path: String,
    pub ytdlp_timeout_secs: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: crate::transcript::default_languages(),
            allow_any_language: true,
            strategies: vec![
                StrategyKind::CaptionsApi,
                StrategyKind::SubtitleDownload,
                StrategyKind::TimedText,
            ],
            max_attempts: 3,
            initial_backoff_ms: 2000,
            http_timeout_secs: 20,
            overall_timeout_secs: 180,
            skip_after_ip_block: false,
            user_agent: crate::transcript::DEFAULT_USER_AGENT.to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            ytdlp_timeout_secs: 60,
        }
    }
}

impl TranscriptSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.clamp(10, 30))
    }

    pub fn overall_timeout(&self) -> Option<Duration> {
        (self.overall_timeout_secs > 0).then(|| Duration::from_secs(self.overall_timeout_secs))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// Deployed frontend, appended to the allowed origins when set.
    pub frontend_url: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
            frontend_url: None,
        }
    }
}

impl ServerSettings {
    /// Configured origins plus the frontend URL, without duplicates.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = self.cors_origins.clone();
        if let Some(url) = self.frontend_url.as_deref().map(str::trim) {
            let url = url.trim_end_matches('/');
            if !url.is_empty() && !origins.iter().any(|o| o == url) {
                origins.push(url.to_string());
            }
        }
        origins
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::BlogError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("blogsmith")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
