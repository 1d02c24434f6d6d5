//! Configuration module for blogsmith.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{BlogPrompts, Prompts};
pub use settings::{
    GeneralSettings, LlmSettings, PromptSettings, ServerSettings, Settings, TranscriptSettings,
};
