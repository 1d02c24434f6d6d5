//! CLI module for blogsmith.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// blogsmith - Blog posts from topics and YouTube videos
///
/// Generates Markdown blog posts with an OpenAI-compatible model (Groq by default),
/// optionally translated, and extracts YouTube transcripts through a chain of
/// fallback strategies.
#[derive(Parser, Debug)]
#[command(name = "blogsmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// API key for the chat model endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a blog post about a topic
    Topic {
        /// What the post should be about
        topic: String,

        /// Target language (default: english)
        #[arg(short, long)]
        language: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a blog post from a YouTube video's transcript
    Youtube {
        /// YouTube watch or youtu.be URL
        url: String,

        /// Target language (default: english)
        #[arg(short, long)]
        language: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract a YouTube transcript without generating anything
    Transcript {
        /// YouTube URL or 11-character video ID
        input: String,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_youtube_command() {
        let cli = Cli::try_parse_from([
            "blogsmith",
            "-vv",
            "youtube",
            "https://youtu.be/abc123XYZ",
            "-l",
            "french",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Youtube { url, language, json } => {
                assert_eq!(url, "https://youtu.be/abc123XYZ");
                assert_eq!(language.as_deref(), Some("french"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["blogsmith", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
