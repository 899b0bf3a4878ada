//! Plumbing shared by the network commands: orchestrator steps run on the
//! blocking pool, the loading bar, and turning failures into alert text.

use anyhow::{anyhow, Result};
use std::io::{IsTerminal, Write};
use tokio::sync::oneshot;
use ytdlank_core::backend::Backend;
use ytdlank_core::loading::{self, LoadingBar};
use ytdlank_core::orchestrator::{Orchestrator, ViewListener, ViewState};
use ytdlank_core::ClientError;

const BAR_WIDTH: usize = 30;
const STATUS_WIDTH: usize = 48;

/// Runs `step` on the blocking pool; the curl calls inside block their thread.
pub(super) async fn blocking<B, T, F>(
    mut orch: Orchestrator<B>,
    step: F,
) -> Result<(Orchestrator<B>, T)>
where
    B: Backend + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut Orchestrator<B>) -> T + Send + 'static,
{
    let out = tokio::task::spawn_blocking(move || {
        let out = step(&mut orch);
        (orch, out)
    })
    .await?;
    Ok(out)
}

/// Like [`blocking`], animating the loading bar on stderr until `step` returns.
pub(super) async fn with_loading<B, T, F>(
    orch: Orchestrator<B>,
    step: F,
) -> Result<(Orchestrator<B>, T)>
where
    B: Backend + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut Orchestrator<B>) -> T + Send + 'static,
{
    if !std::io::stderr().is_terminal() {
        return blocking(orch, step).await;
    }

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let ticker = tokio::spawn(async move {
        let mut bar = LoadingBar::start();
        let mut interval = tokio::time::interval(loading::TICK);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    draw(&bar);
                    bar.advance();
                }
                _ = &mut stop_rx => break,
            }
        }
        bar.finish();
        draw(&bar);
        eprint!("\r{:width$}\r", "", width = BAR_WIDTH + 8);
    });

    let out = blocking(orch, step).await;
    let _ = stop_tx.send(());
    let _ = ticker.await;
    out
}

fn draw(bar: &LoadingBar) {
    let mut err = std::io::stderr().lock();
    let _ = write!(err, "\r{}", bar.render(BAR_WIDTH));
    let _ = err.flush();
}

/// Maps a failed step to the alert the orchestrator raised for it.
pub(super) fn settle<B: Backend, T>(
    orch: &mut Orchestrator<B>,
    result: Result<T, ClientError>,
) -> Result<T> {
    result.map_err(|e| {
        tracing::debug!("step failed: {:?}", e);
        anyhow!(orch.take_alert().unwrap_or_else(|| e.to_string()))
    })
}

/// Echoes status-line changes to stderr. Progress lines overwrite each other;
/// failure lines are skipped because the final error repeats them.
pub(super) fn progress_printer() -> ViewListener {
    let mut last = String::new();
    let mut overwriting = false;
    Box::new(move |s: &ViewState| {
        if s.message == last {
            return;
        }
        last = s.message.clone();
        if status_is_failure(&s.message) || s.message.is_empty() {
            return;
        }
        if s.message.starts_with("Downloading...") {
            eprint!("\r{:<width$}", s.message, width = STATUS_WIDTH);
            overwriting = true;
        } else {
            if overwriting {
                eprintln!();
                overwriting = false;
            }
            eprintln!("{}", s.message);
        }
    })
}

fn status_is_failure(message: &str) -> bool {
    message.starts_with("Error:") || message.starts_with("Download failed:")
}
