//! CLI command handlers. Each command is in its own file.

mod common;
mod completions;
mod config;
mod download;
mod info;

pub use completions::run_completions;
pub use config::run_config;
pub use download::run_download;
pub use info::run_info;
