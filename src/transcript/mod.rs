//! Transcript acquisition for YouTube videos.
//!
//! A [`TranscriptExtractor`] runs an ordered chain of [`TranscriptStrategy`]
//! implementations, stopping at the first one that yields text:
//!
//! 1. [`CaptionsApiStrategy`] - caption tracks listed on the watch page
//! 2. [`SubtitleDownloadStrategy`] - yt-dlp metadata plus a subtitle download
//! 3. [`TimedTextStrategy`] - the raw timed-text endpoint
//!
//! Each strategy is retried on transient failures, and every failure is
//! classified so that a total failure can be explained to the user.

mod captions;
pub mod classify;
mod download;
mod extractor;
mod http;
mod retry;
pub mod subtitle;
mod timedtext;

pub use captions::{CaptionSegment, CaptionService, CaptionsApiStrategy, YoutubeCaptionService};
pub use classify::{classify, classify_failure};
pub use download::{
    select_track, MetadataExtractor, SubtitleDownloadStrategy, SubtitleFormat, SubtitleTrack,
    VideoInfo, YtDlpMetadata,
};
pub use extractor::{aggregate_failure, TranscriptExtractor};
pub use http::{BrowserHttp, HttpFetch, DEFAULT_USER_AGENT};
pub use retry::RetryPolicy;
pub use timedtext::TimedTextStrategy;

use crate::error::{ErrorCategory, Result};
use crate::video::VideoReference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifies which strategy produced (or failed to produce) a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CaptionsApi,
    SubtitleDownload,
    TimedText,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::CaptionsApi => write!(f, "captions_api"),
            StrategyKind::SubtitleDownload => write!(f, "subtitle_download"),
            StrategyKind::TimedText => write!(f, "timed_text"),
        }
    }
}

/// A successfully extracted transcript.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    /// Space-joined caption text in temporal order, never empty.
    pub text: String,
    pub video_id: VideoReference,
    pub source_strategy: StrategyKind,
}

/// A failed strategy, kept only to explain a total failure.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: StrategyKind,
    pub category: ErrorCategory,
    pub raw_message: String,
}

impl ExtractionAttempt {
    pub fn failed(strategy: StrategyKind, category: ErrorCategory, raw_message: String) -> Self {
        Self {
            strategy,
            category,
            raw_message,
        }
    }
}

/// One independent way of getting a transcript for a video.
#[async_trait]
pub trait TranscriptStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Return the transcript text, or an error whose message can be classified.
    async fn fetch(&self, video: &VideoReference) -> Result<String>;
}

/// Default preferred caption languages, most specific English variants last.
pub fn default_languages() -> Vec<String> {
    ["en", "en-US", "en-GB"].iter().map(|s| s.to_string()).collect()
}
