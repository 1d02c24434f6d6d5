//! Transcript command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::TranscriptExtractor;
use crate::video::VideoReference;
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(input: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let video = VideoReference::parse_or_id(input)?;
    let extractor = TranscriptExtractor::from_settings(&settings.transcript)?;

    let spinner = Output::spinner(&format!("Extracting transcript for {}...", video));
    let result = extractor.extract(&video).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &result.text)?;
            Output::success(&format!(
                "Wrote {} characters to {} (via {})",
                result.text.len(),
                path,
                result.source_strategy
            ));
        }
        None => println!("{}", result.text),
    }

    Ok(())
}
