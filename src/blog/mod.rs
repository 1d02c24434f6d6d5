//! Blog generation pipeline.
//!
//! Both entry points run the same shape of pipeline:
//!
//! ```text
//! topic:    title -> content ----------------> route -> [translate] -> done
//! youtube:  transcript -> title + content ---> route -> [translate] -> done
//! ```

mod generator;

pub use generator::BlogGenerator;

use crate::error::{BlogError, Result};
use serde::{Deserialize, Serialize};

/// Language that needs no translation step.
pub const DEFAULT_LANGUAGE: &str = "english";

/// A generated post. Content is Markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub title: String,
    pub content: String,
}

/// Everything the pipeline produced for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlogState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    pub current_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<Blog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Where the pipeline goes after content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Translate,
    End,
}

/// English (or no preference) ends the pipeline; any other language is translated.
pub fn route_decision(language: &str) -> Route {
    let language = language.trim();
    if language.is_empty() || language.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
        Route::End
    } else {
        Route::Translate
    }
}

/// Normalize an optional target language to lowercase, defaulting to English.
pub fn target_language(language: Option<&str>) -> String {
    match language.map(str::trim) {
        Some(l) if !l.is_empty() => l.to_lowercase(),
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

/// Which pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usecase {
    Topic,
    Youtube,
}

impl std::str::FromStr for Usecase {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "topic" => Ok(Usecase::Topic),
            "youtube" => Ok(Usecase::Youtube),
            _ => Err(BlogError::InvalidInput(format!("Unknown usecase: {}", s))),
        }
    }
}

impl std::fmt::Display for Usecase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Usecase::Topic => write!(f, "topic"),
            Usecase::Youtube => write!(f, "youtube"),
        }
    }
}
