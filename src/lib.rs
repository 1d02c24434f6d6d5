//! blogsmith - Blog posts from topics and YouTube videos
//!
//! Generates Markdown blog posts with an OpenAI-compatible chat model and,
//! for videos, a transcript obtained through a resilient chain of extraction
//! strategies.
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `video` - YouTube URL parsing
//! - `transcript` - Multi-strategy transcript extraction with retry and failure classification
//! - `llm` - Chat model abstraction and the OpenAI-compatible client
//! - `blog` - Topic and YouTube pipelines, including translation
//! - `cli` - Command line front-end and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use blogsmith::config::Settings;
//! use blogsmith::transcript::TranscriptExtractor;
//! use blogsmith::video::VideoReference;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let extractor = TranscriptExtractor::from_settings(&settings.transcript)?;
//!
//!     let video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ")?;
//!     let transcript = extractor.extract(&video).await?;
//!     println!("{} (via {})", transcript.text, transcript.source_strategy);
//!
//!     Ok(())
//! }
//! ```

pub mod blog;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod openai;
pub mod transcript;
pub mod video;

pub use error::{BlogError, Result};
