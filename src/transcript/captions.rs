//! Captions-API strategy: caption tracks advertised on the watch page.

use super::http::HttpFetch;
use super::subtitle::{decode_entities, tag_regex};
use super::{StrategyKind, TranscriptStrategy};
use crate::error::{BlogError, ErrorCategory, Result};
use crate::video::VideoReference;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument};

/// A timed caption segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// A service that returns caption segments for a video.
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Fetch segments in temporal order, trying `languages` in priority order.
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<CaptionSegment>>;
}

/// Caption track entry as embedded in the watch page player response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Reads the caption track list from the watch page and downloads the chosen track.
pub struct YoutubeCaptionService {
    http: Arc<dyn HttpFetch>,
    allow_any_language: bool,
}

impl YoutubeCaptionService {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            allow_any_language: true,
        }
    }

    /// Whether to fall back to any available language when no preferred one exists.
    pub fn with_any_language(mut self, allow: bool) -> Self {
        self.allow_any_language = allow;
        self
    }
}

#[async_trait]
impl CaptionService for YoutubeCaptionService {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<CaptionSegment>> {
        let page = self
            .http
            .get_text(&format!("https://www.youtube.com/watch?v={}", video_id))
            .await?;

        if page.contains("class=\"g-recaptcha\"") || page.contains("Sign in to confirm") {
            return Err(BlogError::upstream_as(
                ErrorCategory::IpBlocked,
                "YouTube is blocking requests from this IP (bot detection)",
            ));
        }

        let tracks = caption_tracks(&page)?;
        if tracks.is_empty() {
            if page.contains("\"playabilityStatus\":{\"status\":\"ERROR\"") {
                return Err(BlogError::upstream_as(
                    ErrorCategory::NoTranscriptAvailable,
                    format!("Video {} is unavailable", video_id),
                ));
            }
            return Err(BlogError::upstream_as(
                ErrorCategory::NoTranscriptAvailable,
                format!("No transcript available: captions are disabled for video {}", video_id),
            ));
        }

        let track = choose_track(&tracks, languages, self.allow_any_language).ok_or_else(|| {
            BlogError::upstream_as(
                ErrorCategory::NoTranscriptAvailable,
                format!("No transcript available in languages [{}]", languages.join(", ")),
            )
        })?;
        info!(language = %track.language_code, generated = track.is_generated(), "Selected caption track");

        let xml = self.http.get_text(&track.base_url).await?;
        let segments = parse_timedtext_xml(&xml);
        debug!("Parsed {} caption segments", segments.len());

        if segments.is_empty() {
            return Err(BlogError::upstream_as(
                ErrorCategory::NoTranscriptAvailable,
                "No transcript available: caption track is empty",
            ));
        }

        Ok(segments)
    }
}

/// Pull the `captionTracks` array out of the embedded player response.
fn caption_tracks(page: &str) -> Result<Vec<CaptionTrack>> {
    const KEY: &str = "\"captionTracks\":";

    let Some(pos) = page.find(KEY) else {
        return Ok(Vec::new());
    };
    let Some(array) = json_array_at(&page[pos + KEY.len()..]) else {
        return Ok(Vec::new());
    };

    Ok(serde_json::from_str(array)?)
}

/// Slice the JSON array starting at the beginning of `s`, honoring strings and nesting.
fn json_array_at(s: &str) -> Option<&str> {
    if !s.starts_with('[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Preferred languages first (manual tracks before generated ones), then any track.
fn choose_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
    allow_any_language: bool,
) -> Option<&'a CaptionTrack> {
    for language in languages {
        let mut matching = tracks
            .iter()
            .filter(|t| t.language_code.eq_ignore_ascii_case(language));
        let manual = matching.clone().find(|t| !t.is_generated());
        if let Some(track) = manual.or_else(|| matching.next()) {
            return Some(track);
        }
    }

    if allow_any_language {
        tracks.first()
    } else {
        None
    }
}

fn text_element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<text start="([\d.]+)"(?:\s+dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
            .expect("valid timedtext regex")
    })
}

/// Parse the XML timed-text format served for caption tracks.
fn parse_timedtext_xml(xml: &str) -> Vec<CaptionSegment> {
    text_element_regex()
        .captures_iter(xml)
        .filter_map(|caps| {
            // Track payloads are entity-encoded twice (`&amp;#39;`)
            let raw = decode_entities(&decode_entities(&caps[3]));
            let text = tag_regex().replace_all(&raw, "").replace('\n', " ");
            let text = text.trim();
            if text.is_empty() {
                return None;
            }

            Some(CaptionSegment {
                text: text.to_string(),
                start: caps[1].parse().unwrap_or(0.0),
                duration: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0),
            })
        })
        .collect()
}

/// First strategy in the chain: a captions service queried by video id.
pub struct CaptionsApiStrategy {
    service: Arc<dyn CaptionService>,
    languages: Vec<String>,
}

impl CaptionsApiStrategy {
    pub fn new(service: Arc<dyn CaptionService>, languages: Vec<String>) -> Self {
        Self { service, languages }
    }
}

#[async_trait]
impl TranscriptStrategy for CaptionsApiStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CaptionsApi
    }

    async fn fetch(&self, video: &VideoReference) -> Result<String> {
        let segments = self.service.fetch(video.as_str(), &self.languages).await?;

        Ok(segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
