//! CLI for the ytdlank download client.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use ytdlank_core::config;

use commands::{run_completions, run_config, run_download, run_info};

/// Top-level CLI for ytdlank.
#[derive(Debug, Parser)]
#[command(name = "ytdlank")]
#[command(about = "ytdlank: fetch video formats from a download backend and save them", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides `server_url` from config.toml).
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show title, details and available formats for a video URL.
    Info {
        /// Video page URL.
        url: String,
        /// Print the backend's metadata as JSON instead of the card.
        #[arg(long)]
        json: bool,
    },

    /// Download a video in the chosen format and save it locally.
    Download {
        /// Video page URL.
        url: String,
        /// Format id (see `ytdlank info`); defaults to the first listed format.
        #[arg(long, short = 'f', value_name = "ID")]
        format: Option<String>,
        /// Directory to save into (default: config `download_dir`, else current directory).
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Print the SHA-256 of the saved file.
        #[arg(long)]
        sha256: bool,
    },

    /// Show the config file path and effective settings.
    Config,

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let mut cfg = config::load_or_init()?;
        if let Some(server) = cli.server {
            cfg.server_url = server;
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Info { url, json } => run_info(&cfg, &url, json).await?,
            CliCommand::Download {
                url,
                format,
                output_dir,
                sha256,
            } => {
                let dir = match output_dir.or_else(|| cfg.download_dir.clone()) {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_download(&cfg, &url, format, &dir, sha256).await?;
            }
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
