//! Keyword-based classification of upstream failures.

use crate::error::{BlogError, ErrorCategory};
use crate::video::VideoReference;
use regex::Regex;
use std::sync::OnceLock;

const RATE_LIMIT_TERMS: &[&str] = &["rate limit", "rate-limit", "429", "too many requests"];

const BLOCKING_TERMS: &[&str] = &[
    "blocking",
    "blocked",
    "bot",
    "sign in",
    "403",
    "forbidden",
    "captcha",
];

const UNAVAILABLE_TERMS: &[&str] = &[
    "not available",
    "unavailable",
    "no transcript",
    "no captions",
    "no subtitles",
    "disabled",
    "empty transcript",
];

const NETWORK_TERMS: &[&str] = &[
    "network error",
    "resolution",
    "getaddrinfo",
    "failed to resolve",
    "dns error",
    "connection failed",
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
];

/// Normalize a raw failure message into one of the upstream categories.
///
/// Matching is case-insensitive and checked in priority order, so a message
/// that mentions both a 429 and a timeout counts as rate limiting.
pub fn classify(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|term| lower.contains(term));

    if has_any(RATE_LIMIT_TERMS) {
        ErrorCategory::RateLimited
    } else if has_any(BLOCKING_TERMS) {
        ErrorCategory::IpBlocked
    } else if has_any(UNAVAILABLE_TERMS) {
        ErrorCategory::NoTranscriptAvailable
    } else if has_any(NETWORK_TERMS) {
        ErrorCategory::NetworkError
    } else {
        ErrorCategory::Unknown
    }
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://\S+").expect("valid url regex"))
}

/// Category of a strategy failure for `video`.
///
/// Failures raised with a category keep it. Anything else (yt-dlp stderr,
/// transport errors) is keyword-matched with URLs and the video id removed,
/// since ids such as `x429yzABCDE` would otherwise read as status codes.
pub fn classify_failure(err: &BlogError, video: &VideoReference) -> ErrorCategory {
    match err {
        BlogError::Upstream {
            category: Some(category),
            ..
        }
        | BlogError::ExtractionFailed { category, .. } => *category,
        other => {
            let text = url_regex().replace_all(&other.to_string(), " ").to_lowercase();
            classify(&text.replace(&video.as_str().to_lowercase(), " "))
        }
    }
}
