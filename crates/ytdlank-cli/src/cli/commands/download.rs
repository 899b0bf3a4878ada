//! `ytdlank download <url>` – fetch info, pick a format, follow progress, save the file.

use anyhow::{bail, Context, Result};
use std::path::Path;
use ytdlank_core::backend::HttpBackend;
use ytdlank_core::checksum;
use ytdlank_core::config::ClientConfig;
use ytdlank_core::orchestrator::Orchestrator;

use super::common::{blocking, progress_printer, settle, with_loading};
use super::info::print_card;

pub async fn run_download(
    cfg: &ClientConfig,
    url: &str,
    format: Option<String>,
    output_dir: &Path,
    sha256: bool,
) -> Result<()> {
    let backend = HttpBackend::from_config(cfg).context("bad server_url")?;
    let orch = Orchestrator::new(backend, cfg);

    let target = url.to_string();
    let (mut orch, fetched) =
        with_loading(orch, move |o| o.fetch_info(&target).map(|_| ())).await?;
    settle(&mut orch, fetched)?;
    print_card(orch.view());

    if !orch.view().download_enabled {
        bail!("{}", orch.view().message);
    }
    let format_id = match format {
        Some(id) => {
            if orch.select_format(&id).is_err() {
                let known: Vec<&str> = orch
                    .view()
                    .options
                    .iter()
                    .map(|o| o.format_id.as_str())
                    .collect();
                bail!("unknown format {} (available: {})", id, known.join(", "));
            }
            id
        }
        None => match orch.view().selected.clone() {
            Some(id) => id,
            None => bail!("Choose a format"),
        },
    };
    if let Some(opt) = orch.view().selected_option() {
        eprintln!("Format {}: {}", opt.format_id, opt.label);
    }
    eprintln!("{}", orch.view().size_hint);

    orch.set_listener(progress_printer());
    let target = url.to_string();
    let (mut orch, started) =
        blocking(orch, move |o| o.start_download(&target, &format_id)).await?;
    let completed = settle(&mut orch, started)?;
    tracing::info!(
        session = %completed.session.session_id,
        url = %completed.download_url,
        server_file = completed.server_filename.as_deref().unwrap_or("-"),
        "download finished on backend"
    );

    let dir = output_dir.to_path_buf();
    let (mut orch, saved) = blocking(orch, move |o| o.save_file(&completed, &dir)).await?;
    let path = settle(&mut orch, saved)?;

    if sha256 {
        let digest = checksum::sha256_path(&path)?;
        println!("{}  {}", digest, path.display());
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
