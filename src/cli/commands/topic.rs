//! Topic command implementation.

use crate::blog::{BlogGenerator, BlogState, Usecase};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the topic command.
pub async fn run_topic(
    topic: &str,
    language: Option<&str>,
    json: bool,
    api_key: &str,
    settings: Settings,
) -> Result<()> {
    let generator = BlogGenerator::from_settings(&settings, api_key)?;

    let spinner = Output::spinner(&format!("Writing a post about '{}'...", topic.trim()));
    let result = generator.generate(Usecase::Topic, topic, language).await;
    spinner.finish_and_clear();

    match result {
        Ok(state) => print_state(&state, json),
        Err(e) => {
            Output::error(&format!("Failed to generate blog: {}", e));
            Err(e.into())
        }
    }
}

/// Print a finished pipeline state, as JSON or as Markdown.
pub(crate) fn print_state(state: &BlogState, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match &state.blog {
        Some(blog) => {
            Output::blog(blog);
            if state.current_language != crate::blog::DEFAULT_LANGUAGE {
                println!();
                Output::kv("Language", &state.current_language);
            }
            Ok(())
        }
        None => Err(anyhow::anyhow!("Pipeline finished without a blog")),
    }
}
