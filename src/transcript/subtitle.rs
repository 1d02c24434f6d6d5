//! Plain-text extraction from WebVTT and SRT subtitle payloads.
//!
//! Both formats share the same structure once headers, cue timings, cue
//! indices and inline markup are removed, so a single pass handles either.

use regex::Regex;
use std::sync::OnceLock;

/// Header lines that introduce a WebVTT file or one of its metadata blocks.
const HEADER_MARKERS: &[&str] = &["WEBVTT", "Kind:", "Language:", "NOTE", "STYLE", "REGION"];

pub(crate) fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Word-level timing tags such as `<00:00:00.480>`, only present in rolling auto-captions.
fn timestamp_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<(?:\d+:)?\d{2}:\d{2}[.,]\d{3}>").expect("valid timestamp regex"))
}

/// Whether `line` opens a header or metadata block. The marker must stand alone,
/// so captions like "NOTED." are not mistaken for a NOTE block.
fn is_header(line: &str) -> bool {
    HEADER_MARKERS.iter().any(|marker| match line.strip_prefix(marker) {
        Some(rest) => {
            marker.ends_with(':')
                || rest.is_empty()
                || rest.starts_with(|c: char| c.is_whitespace() || c == ':')
        }
        None => false,
    })
}

/// Extract the spoken text from a subtitle payload.
///
/// Never fails: unrecognized input degrades to whatever text lines survive,
/// possibly an empty string. Callers must treat an empty result as "no
/// transcript".
pub fn parse(raw: &str) -> String {
    // Rolling auto-captions repeat the previous line at the top of each cue
    let rolling = timestamp_tag_regex().is_match(raw);
    let mut lines: Vec<String> = Vec::new();
    let mut in_cue = false;
    let mut in_metadata = false;

    for line in raw.lines() {
        let line = line.trim();

        if line.is_empty() {
            in_cue = false;
            in_metadata = false;
            continue;
        }
        if line.contains("-->") {
            in_cue = true;
            in_metadata = false;
            continue;
        }
        if in_metadata {
            continue;
        }
        // Cue payloads are never headers
        if !in_cue && is_header(line) {
            in_metadata = true;
            continue;
        }
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let text = tag_regex().replace_all(line, "");
        let text = decode_entities(text.trim());
        if text.is_empty() {
            continue;
        }

        if rolling && lines.last().is_some_and(|prev| *prev == text) {
            continue;
        }

        lines.push(text);
    }

    lines.join(" ")
}

/// Decode the handful of HTML entities that appear in caption payloads.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
