//! Error types for blogsmith.

use serde::Serialize;
use thiserror::Error;

/// Upstream failure taxonomy used by the transcript extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimited,
    IpBlocked,
    NoTranscriptAvailable,
    NetworkError,
    Unknown,
}

impl ErrorCategory {
    /// Whether a failure of this category is worth retrying within a strategy.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::NetworkError | ErrorCategory::RateLimited)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::RateLimited => write!(f, "rate_limited"),
            ErrorCategory::IpBlocked => write!(f, "ip_blocked"),
            ErrorCategory::NoTranscriptAvailable => write!(f, "no_transcript_available"),
            ErrorCategory::NetworkError => write!(f, "network_error"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

/// Library-level error type for blogsmith operations.
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Every transcript strategy was exhausted.
    #[error("{message}")]
    ExtractionFailed {
        category: ErrorCategory,
        message: String,
    },

    /// A single upstream call failed. `category` is set where the failure site
    /// knows it; otherwise the message is keyword-classified.
    #[error("{message}")]
    Upstream {
        category: Option<ErrorCategory>,
        message: String,
    },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl BlogError {
    /// Upstream failure whose category is only known from its text.
    pub fn upstream(message: impl Into<String>) -> Self {
        BlogError::Upstream {
            category: None,
            message: message.into(),
        }
    }

    /// Upstream failure with a known category.
    pub fn upstream_as(category: ErrorCategory, message: impl Into<String>) -> Self {
        BlogError::Upstream {
            category: Some(category),
            message: message.into(),
        }
    }

    /// Client errors map to HTTP 400; everything else is a server error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BlogError::InvalidInput(_))
    }
}

/// Result type alias for blogsmith operations.
pub type Result<T> = std::result::Result<T, BlogError>;
