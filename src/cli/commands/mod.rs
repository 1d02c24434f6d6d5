//! CLI command implementations.

mod config;
mod serve;
mod topic;
mod transcript;
mod youtube;

pub use config::run_config;
pub use serve::{router, run_serve, AppState};
pub use topic::run_topic;
pub use transcript::run_transcript;
pub use youtube::run_youtube;
