//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use super::Output;
use crate::config::Settings;
use crate::error::{BlogError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Topic posts only need the model.
    Topic,
    /// Video posts need the model; yt-dlp is optional.
    Youtube,
    /// Transcript extraction needs nothing mandatory.
    Transcript,
    /// The server exposes every operation.
    Serve,
}

impl Operation {
    fn needs_llm(self) -> bool {
        !matches!(self, Operation::Transcript)
    }

    fn uses_ytdlp(self) -> bool {
        !matches!(self, Operation::Topic)
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns the API key to use when the operation needs the model. A missing
/// yt-dlp only produces a warning, since the other strategies still work.
pub fn check(
    operation: Operation,
    explicit_key: Option<&str>,
    settings: &Settings,
) -> Result<Option<String>> {
    let key = if operation.needs_llm() {
        Some(resolve_api_key(explicit_key, settings)?)
    } else {
        None
    };

    if operation.uses_ytdlp() {
        if let Err(e) = check_tool(&settings.transcript.ytdlp_path) {
            Output::warning(&format!(
                "{}. Subtitle downloads via yt-dlp will fail over to the next strategy.",
                e
            ));
        }
    }

    Ok(key)
}

/// Pick the API key: command line or environment first, then the config file.
pub fn resolve_api_key(explicit: Option<&str>, settings: &Settings) -> Result<String> {
    let usable = |key: &&str| !key.trim().is_empty();
    explicit
        .filter(usable)
        .or(settings.llm.api_key.as_deref().filter(usable))
        .map(|k| k.trim().to_string())
        .ok_or_else(|| {
            BlogError::Config(
                "GROQ_API_KEY not set. Set it with: export GROQ_API_KEY='gsk_...' or add api_key to the [llm] config section".to_string(),
            )
        })
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(BlogError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BlogError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(BlogError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
