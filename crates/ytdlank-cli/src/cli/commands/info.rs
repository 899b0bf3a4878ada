//! `ytdlank info <url>` – show the video card and its formats.

use anyhow::{Context, Result};
use ytdlank_core::backend::HttpBackend;
use ytdlank_core::config::ClientConfig;
use ytdlank_core::orchestrator::{Orchestrator, ViewState};

use super::common::{settle, with_loading};

pub async fn run_info(cfg: &ClientConfig, url: &str, json: bool) -> Result<()> {
    let backend = HttpBackend::from_config(cfg).context("bad server_url")?;
    let orch = Orchestrator::new(backend, cfg);

    let target = url.to_string();
    let (mut orch, fetched) =
        with_loading(orch, move |o| o.fetch_info(&target).map(|_| ())).await?;
    settle(&mut orch, fetched)?;

    if json {
        if let Some(info) = orch.info() {
            println!("{}", serde_json::to_string_pretty(info)?);
        }
        return Ok(());
    }
    print_card(orch.view());
    print_formats(orch.view());
    Ok(())
}

pub(super) fn print_card(view: &ViewState) {
    let card = &view.card;
    println!("{}", card.title);
    if !card.uploader.is_empty() {
        println!("{}", card.uploader);
    }
    println!("{}", card.details);
    if let Some(thumb) = &card.thumbnail {
        println!("Thumbnail: {}", thumb);
    }
    if !card.description.is_empty() {
        println!();
        println!("{}", card.description);
    }
    println!();
}

fn print_formats(view: &ViewState) {
    if view.options.is_empty() {
        println!("{}", view.message);
        return;
    }
    println!("{:<12} {}", "ID", "FORMAT");
    for opt in &view.options {
        let marker = if view.selected.as_deref() == Some(opt.format_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{:<12} {}{}", opt.format_id, marker, opt.label);
    }
    println!();
    println!("{}", view.size_hint);
}
