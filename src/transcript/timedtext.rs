//! Last-resort strategy: the raw timed-text endpoint.

use super::http::HttpFetch;
use super::{subtitle, StrategyKind, TranscriptStrategy};
use crate::error::{BlogError, ErrorCategory, Result};
use crate::video::VideoReference;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

pub struct TimedTextStrategy {
    http: Arc<dyn HttpFetch>,
    languages: Vec<String>,
}

impl TimedTextStrategy {
    pub fn new(http: Arc<dyn HttpFetch>, languages: Vec<String>) -> Self {
        Self { http, languages }
    }

    fn endpoint(video: &VideoReference, language: &str) -> String {
        format!("{}?v={}&lang={}&fmt=vtt", TIMEDTEXT_URL, video, language)
    }
}

#[async_trait]
impl TranscriptStrategy for TimedTextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TimedText
    }

    async fn fetch(&self, video: &VideoReference) -> Result<String> {
        let mut last_error = None;

        for language in &self.languages {
            match self.http.get_text(&Self::endpoint(video, language)).await {
                Ok(blob) => {
                    let text = subtitle::parse(&blob);
                    if !text.is_empty() {
                        return Ok(text);
                    }
                    debug!(%language, "timed-text endpoint returned no captions");
                }
                Err(e) => {
                    debug!(%language, "timed-text request failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        // Transport failures say more than an empty payload does
        Err(last_error.unwrap_or_else(|| {
            BlogError::upstream_as(
                ErrorCategory::NoTranscriptAvailable,
                format!("No transcript available from timed-text endpoint for video {}", video),
            )
        }))
    }
}
