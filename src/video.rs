//! YouTube video references.
//!
//! Turns user-supplied URLs into the opaque video id the transcript
//! strategies work with.

use crate::error::{BlogError, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use url::Url;

/// An opaque YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    /// Parse a YouTube URL in either the `watch?v=<id>` or the `youtu.be/<id>` form.
    ///
    /// Trailing query parameters and fragments are ignored. No network access.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BlogError::InvalidInput("YouTube URL is required".to_string()));
        }

        extract_video_id(input)
            .map(Self)
            .ok_or_else(|| BlogError::InvalidInput("Invalid YouTube URL format".to_string()))
    }

    /// Like [`VideoReference::parse`], but also accepts a bare 11-character id.
    pub fn parse_or_id(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if bare_id_regex().is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Self::parse(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn bare_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"))
}

fn extract_video_id(input: &str) -> Option<String> {
    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.to_lowercase();

    let candidate = if host == "youtu.be" || host == "www.youtu.be" {
        // Short form: first path segment
        url.path_segments()?.next()?.to_string()
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        if url.path() != "/watch" {
            return None;
        }
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?
    } else {
        return None;
    };

    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    valid.then_some(candidate)
}
