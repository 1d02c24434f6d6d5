//! Metadata + subtitle download strategy, backed by yt-dlp.

use super::http::HttpFetch;
use super::{subtitle, StrategyKind, TranscriptStrategy};
use crate::error::{BlogError, ErrorCategory, Result};
use crate::video::VideoReference;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Subtitle formats the parser handles, in order of preference.
const PREFERRED_EXTS: &[&str] = &["vtt", "srt"];

/// One downloadable rendition of a subtitle track.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleFormat {
    pub url: String,
    pub ext: String,
}

/// All renditions available for one language.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleTrack {
    pub language: String,
    pub formats: Vec<SubtitleFormat>,
}

/// Subtitle-related metadata for a video, in the order the extractor reported it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoInfo {
    pub subtitles: Vec<SubtitleTrack>,
    pub automatic_captions: Vec<SubtitleTrack>,
}

impl VideoInfo {
    /// Build from yt-dlp's JSON info dict.
    pub fn from_json(json: &serde_json::Value) -> Self {
        Self {
            subtitles: tracks_from_json(&json["subtitles"]),
            automatic_captions: tracks_from_json(&json["automatic_captions"]),
        }
    }
}

fn tracks_from_json(value: &serde_json::Value) -> Vec<SubtitleTrack> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };

    map.iter()
        .map(|(language, formats)| SubtitleTrack {
            language: language.clone(),
            formats: formats
                .as_array()
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| {
                            Some(SubtitleFormat {
                                url: entry["url"].as_str()?.to_string(),
                                ext: entry["ext"].as_str().unwrap_or_default().to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .filter(|track| !track.formats.is_empty())
        .collect()
}

/// Pick a subtitle rendition deterministically.
///
/// Preferred languages are tried in order, manual tracks before automatic
/// captions; otherwise the first reported track of any language wins. Within a
/// track, WebVTT is preferred over SRT over whatever comes first.
pub fn select_track<'a>(
    info: &'a VideoInfo,
    languages: &[String],
) -> Option<(&'a SubtitleTrack, &'a SubtitleFormat)> {
    let find = |tracks: &'a [SubtitleTrack], language: &str| {
        tracks
            .iter()
            .find(|t| t.language.eq_ignore_ascii_case(language))
    };

    let track = languages
        .iter()
        .find_map(|language| {
            find(info.subtitles.as_slice(), language.as_str())
                .or_else(|| find(info.automatic_captions.as_slice(), language.as_str()))
        })
        .or_else(|| info.subtitles.first())
        .or_else(|| info.automatic_captions.first())?;

    let format = PREFERRED_EXTS
        .iter()
        .find_map(|ext| track.formats.iter().find(|f| f.ext == *ext))
        .or_else(|| track.formats.first())?;

    Some((track, format))
}

/// A general-purpose video metadata extractor.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Fetch subtitle metadata without downloading any media.
    async fn extract_info(&self, url: &str) -> Result<VideoInfo>;
}

/// Runs the `yt-dlp` binary with media download disabled.
pub struct YtDlpMetadata {
    binary: String,
    timeout: Duration,
}

impl YtDlpMetadata {
    pub fn new(binary: &str, timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl MetadataExtractor for YtDlpMetadata {
    #[instrument(skip(self))]
    async fn extract_info(&self, url: &str) -> Result<VideoInfo> {
        let run = Command::new(&self.binary)
            .args([
                "--dump-single-json",
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--no-playlist",
                "--no-warnings",
                url,
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Err(_) => {
                return Err(BlogError::upstream_as(
                    ErrorCategory::NetworkError,
                    format!("Network error: {} timed out after {:?}", self.binary, self.timeout),
                ))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlogError::ToolNotFound(self.binary.clone()));
            }
            Ok(Err(e)) => {
                return Err(BlogError::ToolFailed(format!("Failed to run {}: {}", self.binary, e)));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BlogError::upstream(format!("{} failed: {}", self.binary, stderr.trim())));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            BlogError::ToolFailed(format!("Failed to parse {} output: {}", self.binary, e))
        })?;

        Ok(VideoInfo::from_json(&json))
    }
}

/// Second strategy: look up subtitle tracks via metadata, download one, parse it.
pub struct SubtitleDownloadStrategy {
    metadata: Arc<dyn MetadataExtractor>,
    http: Arc<dyn HttpFetch>,
    languages: Vec<String>,
}

impl SubtitleDownloadStrategy {
    pub fn new(
        metadata: Arc<dyn MetadataExtractor>,
        http: Arc<dyn HttpFetch>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            metadata,
            http,
            languages,
        }
    }
}

#[async_trait]
impl TranscriptStrategy for SubtitleDownloadStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SubtitleDownload
    }

    async fn fetch(&self, video: &VideoReference) -> Result<String> {
        let info = self.metadata.extract_info(&video.watch_url()).await?;

        let (track, format) = select_track(&info, &self.languages).ok_or_else(|| {
            BlogError::upstream_as(
                ErrorCategory::NoTranscriptAvailable,
                format!("No subtitles available for video {}", video),
            )
        })?;
        info!(language = %track.language, ext = %format.ext, "Downloading subtitle track");

        let blob = self.http.get_text(&format.url).await?;
        debug!("Downloaded {} bytes of subtitles", blob.len());

        Ok(subtitle::parse(&blob))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_info() -> VideoInfo {
        VideoInfo::from_json(&json!({
            "id": "abc123XYZ",
            "subtitles": {
                "de": [{"ext": "vtt", "url": "https://subs/de.vtt"}],
                "en-GB": [
                    {"ext": "json3", "url": "https://subs/en-GB.json3"},
                    {"ext": "srt", "url": "https://subs/en-GB.srt"}
                ]
            },
            "automatic_captions": {
                "en": [
                    {"ext": "srv3", "url": "https://auto/en.srv3"},
                    {"ext": "vtt", "url": "https://auto/en.vtt"}
                ],
                "fr": [{"ext": "vtt", "url": "https://auto/fr.vtt"}]
            }
        }))
    }

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_json_keeps_reported_order() {
        let info = sample_info();
        let order: Vec<_> = info.subtitles.iter().map(|t| t.language.as_str()).collect();
        assert_eq!(order, vec!["de", "en-GB"]);
        assert_eq!(info.automatic_captions.len(), 2);
    }

    #[test]
    fn test_missing_sections() {
        let info = VideoInfo::from_json(&json!({"id": "x", "subtitles": null}));
        assert_eq!(info, VideoInfo::default());
    }

    #[test]
    fn test_select_follows_language_priority() {
        let info = sample_info();

        // "en" is only available as automatic captions, but comes first in priority
        let (track, format) = select_track(&info, &langs(&["en", "en-US", "en-GB"])).unwrap();
        assert_eq!(track.language, "en");
        assert_eq!(format.url, "https://auto/en.vtt");

        let (track, format) = select_track(&info, &langs(&["en-GB", "en"])).unwrap();
        assert_eq!(track.language, "en-GB");
        assert_eq!(format.ext, "srt");
    }

    #[test]
    fn test_select_falls_back_to_first_track() {
        let info = sample_info();
        let (track, _) = select_track(&info, &langs(&["ja"])).unwrap();
        assert_eq!(track.language, "de");

        let auto_only = VideoInfo {
            subtitles: Vec::new(),
            automatic_captions: sample_info().automatic_captions,
        };
        let (track, format) = select_track(&auto_only, &langs(&["ja"])).unwrap();
        assert_eq!(track.language, "en");
        assert_eq!(format.ext, "vtt");
    }

    #[test]
    fn test_select_nothing_available() {
        assert!(select_track(&VideoInfo::default(), &langs(&["en"])).is_none());
    }

    struct StaticMetadata(VideoInfo);

    #[async_trait]
    impl MetadataExtractor for StaticMetadata {
        async fn extract_info(&self, _url: &str) -> Result<VideoInfo> {
            Ok(self.0.clone())
        }
    }

    struct StaticHttp(&'static str);

    #[async_trait]
    impl HttpFetch for StaticHttp {
        async fn get_text(&self, url: &str) -> Result<String> {
            assert_eq!(url, "https://auto/en.vtt");
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_strategy_downloads_and_parses() {
        let strategy = SubtitleDownloadStrategy::new(
            Arc::new(StaticMetadata(sample_info())),
            Arc::new(StaticHttp("WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nfrom <c>subs</c>\n")),
            langs(&["en"]),
        );
        let video = VideoReference::parse("https://youtu.be/abc123XYZ").unwrap();

        assert_eq!(strategy.fetch(&video).await.unwrap(), "from subs");
    }

    #[tokio::test]
    async fn test_strategy_without_tracks() {
        let strategy = SubtitleDownloadStrategy::new(
            Arc::new(StaticMetadata(VideoInfo::default())),
            Arc::new(StaticHttp("")),
            langs(&["en"]),
        );
        let video = VideoReference::parse("https://youtu.be/abc123XYZ").unwrap();

        let err = strategy.fetch(&video).await.unwrap_err();
        assert!(err.to_string().contains("No subtitles available"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let extractor = YtDlpMetadata::new("blogsmith-no-such-binary", Duration::from_secs(5));
        let err = extractor.extract_info("https://www.youtube.com/watch?v=abc").await.unwrap_err();
        assert!(matches!(err, BlogError::ToolNotFound(_)));
    }
}
