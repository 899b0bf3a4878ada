//! `ytdlank config` – show where the config lives and what is in effect.

use anyhow::Result;
use ytdlank_core::config::{self, ClientConfig};

pub fn run_config(cfg: &ClientConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
