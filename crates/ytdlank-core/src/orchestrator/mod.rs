//! Client orchestrator: fetch metadata, pick a format, download with progress.
//!
//! Holds the last fetched [`VideoInfo`] and a [`ViewState`] it updates as each
//! step progresses. One operation runs at a time (`&mut self`); the only
//! waiting is for a terminal progress event on the backend's event stream.

mod view;

pub use view::{FormatOption, InfoCard, ViewListener, ViewState};

use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::filename::client_filename;
use crate::model::{DownloadRequest, DownloadSession, ProgressStatus, VideoInfo};
use crate::present;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use view::Presenter;

/// Result of a download that reached `finished`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedDownload {
    pub session: DownloadSession,
    /// As sent by the backend, usually server-relative (`/download/<name>`).
    pub download_url: String,
    /// Name to save the file under.
    pub filename: String,
    pub server_filename: Option<String>,
}

pub struct Orchestrator<B: Backend> {
    backend: B,
    filename_tag: String,
    description_preview_chars: usize,
    info: Option<VideoInfo>,
    view: Presenter,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B, cfg: &ClientConfig) -> Self {
        Self {
            backend,
            filename_tag: cfg.filename_tag.clone(),
            description_preview_chars: cfg.description_preview_chars,
            info: None,
            view: Presenter::default(),
        }
    }

    /// Registers a callback run after every view change.
    pub fn with_listener(mut self, listener: ViewListener) -> Self {
        self.view.set_listener(listener);
        self
    }

    /// Replaces the view listener.
    pub fn set_listener(&mut self, listener: ViewListener) {
        self.view.set_listener(listener);
    }

    pub fn view(&self) -> &ViewState {
        &self.view.state
    }

    /// Last successfully fetched metadata.
    pub fn info(&self) -> Option<&VideoInfo> {
        self.info.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Clears and returns the pending alert.
    pub fn take_alert(&mut self) -> Option<String> {
        self.view.state.alert.take()
    }

    /// Fetches metadata for `url` and fills the card and the format list.
    ///
    /// Download stays disabled unless at least one format has an id.
    pub fn fetch_info(&mut self, url: &str) -> Result<&VideoInfo, ClientError> {
        let url = url.trim();
        if url.is_empty() {
            self.view.alert(ClientError::EmptyUrl.to_string());
            return Err(ClientError::EmptyUrl);
        }

        self.view.update(|s| {
            s.info_visible = false;
            s.download_enabled = false;
            s.message.clear();
            s.loading = true;
        });

        let info = match self.backend.fetch_info(url) {
            Ok(info) => info,
            Err(e) => {
                let text = e.to_string();
                self.view.update(|s| {
                    s.loading = false;
                    s.message = format!("Error: {}", text);
                });
                self.view
                    .alert(format!("Error fetching video info: {}", text));
                return Err(e);
            }
        };

        let card = InfoCard {
            title: info
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            uploader: present::uploader_line(&info),
            details: present::details_line(&info),
            description: present::description_preview(
                info.description.as_deref(),
                self.description_preview_chars,
            ),
            thumbnail: info.thumbnail.clone().filter(|t| !t.is_empty()),
        };

        let options: Vec<FormatOption> = info
            .formats
            .iter()
            .filter_map(|f| {
                let format_id = f.format_id.clone().filter(|id| !id.is_empty())?;
                let quality = present::format_quality(f);
                Some(FormatOption {
                    format_id,
                    label: present::format_label(f),
                    filesize: f.known_size(),
                    resolution: f
                        .resolution
                        .clone()
                        .filter(|r| !r.is_empty())
                        .unwrap_or(quality),
                })
            })
            .collect();
        tracing::debug!(
            usable = options.len(),
            total = info.formats.len(),
            "formats listed"
        );

        self.view.update(|s| {
            s.card = card;
            match options.first() {
                Some(first) => {
                    s.selected = Some(first.format_id.clone());
                    s.size_hint = present::size_hint(first.filesize);
                    s.download_enabled = true;
                }
                None => {
                    s.selected = None;
                    s.size_hint.clear();
                    s.message = "No formats available.".to_string();
                    s.download_enabled = false;
                }
            }
            s.options = options;
            s.loading = false;
            s.info_visible = true;
        });

        let info: &VideoInfo = self.info.insert(info);
        Ok(info)
    }

    /// Selects a listed format and shows its estimated size. No network call.
    pub fn select_format(&mut self, format_id: &str) -> Result<(), ClientError> {
        let filesize = match self.view.state.option(format_id) {
            Some(opt) => opt.filesize,
            None => return Err(ClientError::UnknownFormat(format_id.to_string())),
        };
        let id = format_id.to_string();
        self.view.update(|s| {
            s.selected = Some(id);
            s.size_hint = present::size_hint(filesize);
        });
        Ok(())
    }

    /// Requests a download of `format_id` and follows its progress stream
    /// until `finished` (Ok) or `error` / a dropped stream (Err).
    ///
    /// Download is disabled while this runs and re-enabled afterwards.
    pub fn start_download(
        &mut self,
        url: &str,
        format_id: &str,
    ) -> Result<CompletedDownload, ClientError> {
        let url = url.trim();
        if format_id.is_empty() {
            self.view.alert(ClientError::NoFormatSelected.to_string());
            return Err(ClientError::NoFormatSelected);
        }
        if url.is_empty() {
            self.view.alert(ClientError::EmptyUrl.to_string());
            return Err(ClientError::EmptyUrl);
        }

        let resolution = self
            .view
            .state
            .option(format_id)
            .map(|o| o.resolution.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let title = self.info.as_ref().and_then(|i| i.title.clone());
        let filename = client_filename(title.as_deref(), &resolution, &self.filename_tag);

        self.view.update(|s| {
            s.download_enabled = false;
            s.message = "Starting download...".to_string();
        });

        let request = DownloadRequest {
            url: url.to_string(),
            format_id: format_id.to_string(),
            filename: Some(filename.clone()),
            title,
        };
        let result = self.run_download(&request, filename);

        if let Err(e) = &result {
            let text = format!("Download failed: {}", e);
            let message = text.clone();
            self.view.update(|s| s.message = message);
            self.view.alert(text);
        }
        self.view.update(|s| s.download_enabled = true);
        result
    }

    fn run_download(
        &mut self,
        request: &DownloadRequest,
        filename: String,
    ) -> Result<CompletedDownload, ClientError> {
        let session = self.backend.start_download(request)?;

        let view = &mut self.view;
        let mut outcome: Option<Result<CompletedDownload, ClientError>> = None;
        let watched = self.backend.watch_progress(&session, &mut |ev| match ev.status {
            ProgressStatus::Downloading => {
                let text = present::downloading_message(&ev);
                view.update(|s| s.message = text);
                ControlFlow::Continue(())
            }
            ProgressStatus::Finished => {
                outcome = Some(match ev.download_url.filter(|u| !u.is_empty()) {
                    Some(download_url) => {
                        view.update(|s| s.message = "Download complete".to_string());
                        Ok(CompletedDownload {
                            session: session.clone(),
                            download_url,
                            filename: filename.clone(),
                            server_filename: ev.filename,
                        })
                    }
                    None => Err(ClientError::MissingDownloadUrl),
                });
                ControlFlow::Break(())
            }
            ProgressStatus::Error => {
                let error = ev.error.filter(|e| !e.is_empty());
                let shown = format!("Error: {}", error.as_deref().unwrap_or("Unknown error"));
                view.update(|s| s.message = shown);
                outcome = Some(Err(ClientError::Server(
                    error.unwrap_or_else(|| "Download error".to_string()),
                )));
                ControlFlow::Break(())
            }
            ProgressStatus::Queued | ProgressStatus::Starting | ProgressStatus::Unknown => {
                ControlFlow::Continue(())
            }
        });

        match (watched, outcome) {
            (Err(e), _) => Err(e),
            (Ok(()), Some(result)) => result,
            (Ok(()), None) => Err(ClientError::ConnectionLost),
        }
    }

    /// Saves the finished file as `<dir>/<client file name>`.
    pub fn save_file(
        &mut self,
        completed: &CompletedDownload,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let dest = dir.join(&completed.filename);
        match self.backend.fetch_file(&completed.download_url, &dest) {
            Ok(bytes) => {
                tracing::info!(dest = %dest.display(), bytes, "download saved");
                self.view
                    .update(|s| s.message = format!("Saved {}", dest.display()));
                Ok(dest)
            }
            Err(e) => {
                let text = format!("Download failed: {}", e);
                let message = text.clone();
                self.view.update(|s| s.message = message);
                self.view.alert(text);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests;
