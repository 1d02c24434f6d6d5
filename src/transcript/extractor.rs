//! The ordered strategy chain.

use super::captions::{CaptionsApiStrategy, YoutubeCaptionService};
use super::classify::classify_failure;
use super::download::{SubtitleDownloadStrategy, YtDlpMetadata};
use super::http::{BrowserHttp, HttpFetch};
use super::retry::RetryPolicy;
use super::timedtext::TimedTextStrategy;
use super::{ExtractionAttempt, StrategyKind, TranscriptResult, TranscriptStrategy};
use crate::config::TranscriptSettings;
use crate::error::{BlogError, ErrorCategory, Result};
use crate::video::VideoReference;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Runs transcript strategies in order until one produces text.
///
/// Holds no per-call state, so one extractor can serve concurrent requests.
pub struct TranscriptExtractor {
    strategies: Vec<Arc<dyn TranscriptStrategy>>,
    retry: RetryPolicy,
    skip_after_ip_block: bool,
    overall_timeout: Option<Duration>,
}

impl TranscriptExtractor {
    /// Create an extractor over the given strategies, tried in order.
    pub fn new(strategies: Vec<Arc<dyn TranscriptStrategy>>) -> Self {
        Self {
            strategies,
            retry: RetryPolicy::default(),
            skip_after_ip_block: false,
            overall_timeout: None,
        }
    }

    /// Build the default chain from configuration.
    pub fn from_settings(settings: &TranscriptSettings) -> Result<Self> {
        let http: Arc<dyn HttpFetch> = Arc::new(BrowserHttp::new(
            settings.http_timeout(),
            &settings.user_agent,
        )?);
        let languages = settings.languages.clone();

        let strategies = settings
            .strategies
            .iter()
            .map(|kind| -> Arc<dyn TranscriptStrategy> {
                match kind {
                    StrategyKind::CaptionsApi => {
                        let service = YoutubeCaptionService::new(http.clone())
                            .with_any_language(settings.allow_any_language);
                        Arc::new(CaptionsApiStrategy::new(Arc::new(service), languages.clone()))
                    }
                    StrategyKind::SubtitleDownload => {
                        let metadata = YtDlpMetadata::new(
                            &settings.ytdlp_path,
                            Duration::from_secs(settings.ytdlp_timeout_secs),
                        );
                        Arc::new(SubtitleDownloadStrategy::new(
                            Arc::new(metadata),
                            http.clone(),
                            languages.clone(),
                        ))
                    }
                    StrategyKind::TimedText => {
                        Arc::new(TimedTextStrategy::new(http.clone(), languages.clone()))
                    }
                }
            })
            .collect();

        Ok(Self::new(strategies)
            .with_retry(RetryPolicy::from_settings(settings))
            .skip_after_ip_block(settings.skip_after_ip_block)
            .with_timeout(settings.overall_timeout()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stop the chain once any strategy reports IP blocking.
    pub fn skip_after_ip_block(mut self, skip: bool) -> Self {
        self.skip_after_ip_block = skip;
        self
    }

    /// Bound the whole chain, including retries and backoff.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Extract a transcript, failing only after every strategy is exhausted.
    #[instrument(skip(self), fields(video_id = %video))]
    pub async fn extract(&self, video: &VideoReference) -> Result<TranscriptResult> {
        let Some(limit) = self.overall_timeout else {
            return self.run_chain(video).await;
        };

        match tokio::time::timeout(limit, self.run_chain(video)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Transcript extraction timed out after {:?}", limit);
                Err(BlogError::ExtractionFailed {
                    category: ErrorCategory::NetworkError,
                    message: format!(
                        "Network error: transcript extraction for video {} timed out after {}s",
                        video,
                        limit.as_secs()
                    ),
                })
            }
        }
    }

    async fn run_chain(&self, video: &VideoReference) -> Result<TranscriptResult> {
        let mut attempts: Vec<ExtractionAttempt> = Vec::new();

        for strategy in &self.strategies {
            let kind = strategy.kind();

            if self.skip_after_ip_block
                && attempts
                    .iter()
                    .any(|a| a.category == ErrorCategory::IpBlocked)
            {
                info!("Skipping {} and later strategies after IP block", kind);
                break;
            }

            info!("Trying {}", kind);
            let label = kind.to_string();
            let outcome = self.retry.run(&label, video, || strategy.fetch(video)).await;

            match outcome {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        info!("{} produced {} characters", kind, text.len());
                        return Ok(TranscriptResult {
                            text: text.to_string(),
                            video_id: video.clone(),
                            source_strategy: kind,
                        });
                    }

                    warn!("{} returned an empty transcript", kind);
                    attempts.push(ExtractionAttempt::failed(
                        kind,
                        ErrorCategory::NoTranscriptAvailable,
                        "empty transcript".to_string(),
                    ));
                }
                Err(e) => {
                    let raw = e.to_string();
                    let category = classify_failure(&e, video);
                    warn!("{} failed ({}): {}", kind, category, raw);
                    attempts.push(ExtractionAttempt::failed(kind, category, raw));
                }
            }
        }

        Err(aggregate_failure(video, &attempts))
    }
}

/// Turn the failed attempts of a whole chain into one explanatory error.
///
/// IP blocking outranks missing captions, which outrank rate limiting and
/// network trouble; anything else lists every strategy's raw message.
pub fn aggregate_failure(video: &VideoReference, attempts: &[ExtractionAttempt]) -> BlogError {
    let any = |category: ErrorCategory| attempts.iter().any(|a| a.category == category);
    let details = attempts
        .iter()
        .map(|a| format!("{}: {}", a.strategy, a.raw_message))
        .collect::<Vec<_>>()
        .join("; ");

    let (category, message) = if attempts.is_empty() {
        (
            ErrorCategory::Unknown,
            "No transcript extraction methods are configured".to_string(),
        )
    } else if any(ErrorCategory::IpBlocked) {
        (
            ErrorCategory::IpBlocked,
            "YouTube is blocking transcript requests from this server's IP address. \
             This is common for cloud-hosted deployments; try again later or from a different network."
                .to_string(),
        )
    } else if any(ErrorCategory::NoTranscriptAvailable) {
        (
            ErrorCategory::NoTranscriptAvailable,
            format!(
                "Transcript not available for video {}. The video may not have subtitles/transcripts enabled.",
                video
            ),
        )
    } else if any(ErrorCategory::RateLimited) {
        (
            ErrorCategory::RateLimited,
            "YouTube is rate limiting transcript requests. Please wait a few minutes and try again."
                .to_string(),
        )
    } else if any(ErrorCategory::NetworkError) {
        (
            ErrorCategory::NetworkError,
            format!(
                "Network error: Cannot connect to YouTube. Please check your internet connection and DNS settings. ({})",
                details
            ),
        )
    } else {
        (
            ErrorCategory::Unknown,
            format!("Failed to extract transcript: {}", details),
        )
    };

    BlogError::ExtractionFailed { category, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{CaptionSegment, CaptionService};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy double that always returns the same outcome and counts calls.
    struct FakeStrategy {
        kind: StrategyKind,
        outcome: std::result::Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeStrategy {
        fn ok(kind: StrategyKind, text: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(kind: StrategyKind, message: &str) -> Arc<Self> {
            Arc::new(Self {
                kind,
                outcome: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TranscriptStrategy for FakeStrategy {
        fn kind(&self) -> StrategyKind {
            self.kind
        }

        async fn fetch(&self, _video: &VideoReference) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map_err(BlogError::upstream)
        }
    }

    fn extractor(strategies: Vec<Arc<FakeStrategy>>) -> TranscriptExtractor {
        let strategies = strategies
            .into_iter()
            .map(|s| s as Arc<dyn TranscriptStrategy>)
            .collect();
        TranscriptExtractor::new(strategies).with_retry(RetryPolicy::new(3, Duration::ZERO))
    }

    fn video() -> VideoReference {
        VideoReference::parse("https://www.youtube.com/watch?v=abc123XYZ").unwrap()
    }

    fn failure(err: BlogError) -> (ErrorCategory, String) {
        match err {
            BlogError::ExtractionFailed { category, message } => (category, message),
            other => panic!("expected ExtractionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = FakeStrategy::ok(StrategyKind::CaptionsApi, "from captions");
        let second = FakeStrategy::ok(StrategyKind::SubtitleDownload, "from subtitles");
        let third = FakeStrategy::ok(StrategyKind::TimedText, "from timedtext");

        let result = extractor(vec![first.clone(), second.clone(), third.clone()])
            .extract(&video())
            .await
            .unwrap();

        assert_eq!(result.text, "from captions");
        assert_eq!(result.source_strategy, StrategyKind::CaptionsApi);
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_after_definitive_failure() {
        let first = FakeStrategy::err(StrategyKind::CaptionsApi, "Transcript not available");
        let second = FakeStrategy::ok(StrategyKind::SubtitleDownload, "from subtitles");
        let third = FakeStrategy::ok(StrategyKind::TimedText, "from timedtext");

        let result = extractor(vec![first.clone(), second.clone(), third.clone()])
            .extract(&video())
            .await
            .unwrap();

        assert_eq!(result.text, "from subtitles");
        assert_eq!(result.source_strategy, StrategyKind::SubtitleDownload);
        // Definitive failures are not retried
        assert_eq!(first.calls(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_text_moves_to_next_strategy() {
        let first = FakeStrategy::ok(StrategyKind::CaptionsApi, "   ");
        let second = FakeStrategy::ok(StrategyKind::SubtitleDownload, "  real text ");

        let result = extractor(vec![first, second]).extract(&video()).await.unwrap();
        assert_eq!(result.text, "real text");
    }

    #[tokio::test]
    async fn test_all_network_failures() {
        let strategies = vec![
            FakeStrategy::err(StrategyKind::CaptionsApi, "Network error: connection failed"),
            FakeStrategy::err(StrategyKind::SubtitleDownload, "getaddrinfo failed"),
            FakeStrategy::err(StrategyKind::TimedText, "Failed to resolve 'www.youtube.com'"),
        ];

        let err = extractor(strategies.clone()).extract(&video()).await.unwrap_err();
        let (category, message) = failure(err);

        assert_eq!(category, ErrorCategory::NetworkError);
        assert!(message.contains("Cannot connect to YouTube"));
        assert!(!message.contains("No transcript extraction methods"));
        // Network errors are retried up to the attempt budget
        assert!(strategies.iter().all(|s| s.calls() == 3));
    }

    #[tokio::test]
    async fn test_no_captions_anywhere() {
        let strategies = vec![
            FakeStrategy::err(StrategyKind::CaptionsApi, "No transcript available: captions are disabled"),
            FakeStrategy::err(StrategyKind::SubtitleDownload, "No subtitles available for video abc123XYZ"),
            FakeStrategy::err(StrategyKind::TimedText, "No transcript available from timed-text endpoint"),
        ];

        let err = extractor(strategies).extract(&video()).await.unwrap_err();
        let (category, message) = failure(err);

        assert_eq!(category, ErrorCategory::NoTranscriptAvailable);
        assert!(message.contains("Transcript not available for video abc123XYZ"));
    }

    #[tokio::test]
    async fn test_ip_block_takes_priority() {
        let strategies = vec![
            FakeStrategy::err(StrategyKind::CaptionsApi, "Sign in to confirm you're not a bot"),
            FakeStrategy::err(StrategyKind::SubtitleDownload, "No subtitles available"),
        ];

        let (category, message) = failure(extractor(strategies).extract(&video()).await.unwrap_err());
        assert_eq!(category, ErrorCategory::IpBlocked);
        assert!(message.contains("blocking"));
    }

    #[tokio::test]
    async fn test_skip_after_ip_block() {
        let first = FakeStrategy::err(StrategyKind::CaptionsApi, "HTTP 403 Forbidden");
        let second = FakeStrategy::ok(StrategyKind::SubtitleDownload, "text");

        let lean = extractor(vec![first.clone(), second.clone()]).skip_after_ip_block(true);
        let (category, _) = failure(lean.extract(&video()).await.unwrap_err());
        assert_eq!(category, ErrorCategory::IpBlocked);
        assert_eq!(second.calls(), 0);

        let defensive = extractor(vec![first, second.clone()]);
        assert_eq!(defensive.extract(&video()).await.unwrap().text, "text");
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_generic_failure_lists_each_strategy() {
        let strategies = vec![
            FakeStrategy::err(StrategyKind::CaptionsApi, "weird parse failure"),
            FakeStrategy::err(StrategyKind::TimedText, "HTTP 500 Internal Server Error"),
        ];

        let (category, message) = failure(extractor(strategies).extract(&video()).await.unwrap_err());
        assert_eq!(category, ErrorCategory::Unknown);
        assert_eq!(
            message,
            "Failed to extract transcript: captions_api: weird parse failure; timed_text: HTTP 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_repeated_calls_classify_the_same() {
        let strategies = vec![FakeStrategy::err(StrategyKind::CaptionsApi, "HTTP 429 Too Many Requests")];
        let extractor = extractor(strategies);

        let (first, _) = failure(extractor.extract(&video()).await.unwrap_err());
        let (second, _) = failure(extractor.extract(&video()).await.unwrap_err());
        assert_eq!(first, ErrorCategory::RateLimited);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_overall_timeout() {
        struct Slow;

        #[async_trait]
        impl TranscriptStrategy for Slow {
            fn kind(&self) -> StrategyKind {
                StrategyKind::CaptionsApi
            }

            async fn fetch(&self, _video: &VideoReference) -> Result<String> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("late".to_string())
            }
        }

        let extractor = TranscriptExtractor::new(vec![Arc::new(Slow)])
            .with_timeout(Some(Duration::from_millis(20)));
        let (category, message) = failure(extractor.extract(&video()).await.unwrap_err());
        assert_eq!(category, ErrorCategory::NetworkError);
        assert!(message.contains("timed out"));
    }

    struct FakeCaptions;

    #[async_trait]
    impl CaptionService for FakeCaptions {
        async fn fetch(&self, video_id: &str, _languages: &[String]) -> Result<Vec<CaptionSegment>> {
            assert_eq!(video_id, "abc123XYZ");
            Ok(vec![
                CaptionSegment { text: "Hi".into(), start: 0.0, duration: 1.0 },
                CaptionSegment { text: "there".into(), start: 1.0, duration: 1.0 },
            ])
        }
    }

    #[tokio::test]
    async fn test_end_to_end_from_url() {
        let video = VideoReference::parse("https://www.youtube.com/watch?v=abc123XYZ&t=30").unwrap();
        assert_eq!(video.as_str(), "abc123XYZ");

        let captions = Arc::new(CaptionsApiStrategy::new(
            Arc::new(FakeCaptions),
            crate::transcript::default_languages(),
        ));
        let never = FakeStrategy::ok(StrategyKind::SubtitleDownload, "unused");
        let extractor = TranscriptExtractor::new(vec![captions, never.clone()]);

        let result = extractor.extract(&video).await.unwrap();
        assert_eq!(result.text, "Hi there");
        assert_eq!(result.video_id.as_str(), "abc123XYZ");
        assert_eq!(never.calls(), 0);
    }

    struct NoTracks;

    #[async_trait]
    impl crate::transcript::MetadataExtractor for NoTracks {
        async fn extract_info(&self, _url: &str) -> Result<crate::transcript::VideoInfo> {
            Ok(crate::transcript::VideoInfo::default())
        }
    }

    #[derive(Default)]
    struct EmptyBodies(AtomicUsize);

    #[async_trait]
    impl HttpFetch for EmptyBodies {
        async fn get_text(&self, _url: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_video_id_never_changes_the_diagnosis() {
        for id in ["abc123XYZab", "x429yzABCDE", "xRoBoTabcde", "x403BOTabcd"] {
            let http = Arc::new(EmptyBodies::default());
            let languages = crate::transcript::default_languages();
            let strategies: Vec<Arc<dyn TranscriptStrategy>> = vec![
                Arc::new(SubtitleDownloadStrategy::new(
                    Arc::new(NoTracks),
                    http.clone(),
                    languages.clone(),
                )),
                Arc::new(TimedTextStrategy::new(http.clone(), languages.clone())),
            ];
            let extractor = TranscriptExtractor::new(strategies)
                .with_retry(RetryPolicy::new(3, Duration::ZERO))
                .skip_after_ip_block(true);

            let video = VideoReference::parse(&format!("https://youtu.be/{}", id)).unwrap();
            let (category, message) = failure(extractor.extract(&video).await.unwrap_err());

            assert_eq!(category, ErrorCategory::NoTranscriptAvailable, "video {id}");
            assert!(message.starts_with(&format!("Transcript not available for video {}", id)));
            // One request per language, no retries, timed text not skipped
            assert_eq!(http.0.load(Ordering::SeqCst), languages.len(), "video {id}");
        }
    }

    #[test]
    fn test_from_settings_builds_configured_chain() {
        let settings = TranscriptSettings::default();
        let extractor = TranscriptExtractor::from_settings(&settings).unwrap();
        assert_eq!(
            extractor.strategy_kinds(),
            vec![
                StrategyKind::CaptionsApi,
                StrategyKind::SubtitleDownload,
                StrategyKind::TimedText
            ]
        );
    }
}
