//! YouTube command implementation.

use super::topic::print_state;
use crate::blog::{BlogGenerator, Usecase};
use crate::cli::output::preview;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the youtube command.
pub async fn run_youtube(
    url: &str,
    language: Option<&str>,
    json: bool,
    api_key: &str,
    settings: Settings,
) -> Result<()> {
    let generator = BlogGenerator::from_settings(&settings, api_key)?;

    let spinner = Output::spinner("Extracting transcript and writing post...");
    let result = generator.generate(Usecase::Youtube, url, language).await;
    spinner.finish_and_clear();

    match result {
        Ok(state) => {
            if !json {
                if let (Some(video_id), Some(transcript)) = (&state.video_id, &state.transcript) {
                    Output::kv("Video", video_id);
                    Output::kv("Transcript", &preview(transcript, 120));
                    println!();
                }
            }
            print_state(&state, json)
        }
        Err(e) => {
            Output::error(&format!("Failed to generate blog: {}", e));
            Err(e.into())
        }
    }
}
