//! Backend over HTTP using the curl crate (libcurl).
//!
//! Calls block the current thread; call from `spawn_blocking` if used from async code.

use super::Backend;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::model::{
    DownloadRequest, DownloadResponse, DownloadSession, ProgressEvent, VideoInfo,
};
use crate::sse::SseParser;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::Cell;
use std::fs::{self, File};
use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::str;
use std::time::Duration;
use url::Url;

/// Bytes of a non-2xx body kept for the error message.
const ERROR_BODY_MAX: usize = 4096;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl HttpBackend {
    pub fn new(
        server_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url)?;
        // Paths are joined relative to the base, so it must end in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            connect_timeout,
            request_timeout,
        })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&cfg.server_url, cfg.connect_timeout(), cfg.request_timeout())
    }

    /// Resolves a backend path or a server-relative URL like `/download/x.mp4`.
    pub fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    fn easy(&self, url: &Url) -> Result<curl::easy::Easy, ClientError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        Ok(easy)
    }

    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        let url = self.resolve(path)?;
        let payload = serde_json::to_vec(body)?;
        let mut response = Vec::new();

        let mut easy = self.easy(&url)?;
        easy.post(true)?;
        easy.post_fields_copy(&payload)?;
        easy.timeout(self.request_timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append("Accept: application/json")?;
        // No 100-continue round trip for small bodies.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            tracing::warn!("POST {} returned HTTP {}", url, code);
            return Err(ClientError::from_response(code, &response));
        }
        Ok(serde_json::from_slice(&response)?)
    }
}

impl Backend for HttpBackend {
    fn fetch_info(&self, url: &str) -> Result<VideoInfo, ClientError> {
        tracing::debug!(url, "fetching video info");
        let info: VideoInfo = self.post_json("api/info", &serde_json::json!({ "url": url }))?;
        tracing::info!(
            title = info.title.as_deref().unwrap_or(""),
            formats = info.formats.len(),
            "video info received"
        );
        Ok(info)
    }

    fn start_download(&self, request: &DownloadRequest) -> Result<DownloadSession, ClientError> {
        tracing::debug!(url = %request.url, format_id = %request.format_id, "requesting download");
        let resp: DownloadResponse = self.post_json("api/download", request)?;
        match resp.session_id.filter(|s| !s.is_empty()) {
            Some(session_id) => {
                tracing::info!(session = %session_id, "download session started");
                Ok(DownloadSession { session_id })
            }
            None => Err(ClientError::MissingSession),
        }
    }

    fn watch_progress(
        &self,
        session: &DownloadSession,
        on_event: &mut dyn FnMut(ProgressEvent) -> ControlFlow<()>,
    ) -> Result<(), ClientError> {
        let mut url = self.resolve("api/progress")?;
        url.query_pairs_mut()
            .append_pair("session", &session.session_id);

        let mut easy = self.easy(&url)?;
        let mut list = curl::easy::List::new();
        list.append("Accept: text/event-stream")?;
        easy.http_headers(list)?;

        let mut parser = SseParser::new();
        let mut head: Vec<u8> = Vec::new();
        let mut stopped = false;
        let mut decode_error: Option<serde_json::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if head.len() < ERROR_BODY_MAX {
                    let take = data.len().min(ERROR_BODY_MAX - head.len());
                    head.extend_from_slice(&data[..take]);
                }
                for msg in parser.feed(data) {
                    if !is_default_event(msg.event.as_deref()) {
                        tracing::debug!(event = ?msg.event, "skipping named event");
                        continue;
                    }
                    match serde_json::from_str::<ProgressEvent>(&msg.data) {
                        Ok(ev) => {
                            tracing::trace!(status = ?ev.status, "progress event");
                            if on_event(ev).is_break() {
                                stopped = true;
                                // Short write aborts the transfer.
                                return Ok(0);
                            }
                        }
                        Err(e) => {
                            decode_error = Some(e);
                            return Ok(0);
                        }
                    }
                }
                Ok(data.len())
            })?;
            transfer.perform()
        };

        if let Some(e) = decode_error {
            tracing::warn!("undecodable progress payload: {}", e);
            return Err(e.into());
        }
        if stopped {
            return Ok(());
        }
        if let Err(e) = performed {
            tracing::warn!(session = %session.session_id, "progress stream failed: {}", e);
            return Err(ClientError::ConnectionLost);
        }
        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(ClientError::from_response(code, &head));
        }
        tracing::warn!(session = %session.session_id, "progress stream closed before a terminal event");
        Err(ClientError::ConnectionLost)
    }

    fn fetch_file(&self, download_url: &str, dest: &Path) -> Result<u64, ClientError> {
        let url = self.resolve(download_url)?;
        let part = part_path(dest);
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut easy = self.easy(&url)?;
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;

        let mut file = File::create(&part)?;
        let status: Cell<Option<u32>> = Cell::new(None);
        let mut error_body: Vec<u8> = Vec::new();
        let mut written: u64 = 0;
        let mut storage_error: Option<std::io::Error> = None;

        tracing::debug!(%url, dest = %dest.display(), "fetching file");
        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    if let Some(code) = status_from_header_line(line) {
                        status.set(Some(code));
                    }
                }
                true
            })?;
            transfer.write_function(|data| {
                if !matches!(status.get(), Some(200..=299)) {
                    if error_body.len() < ERROR_BODY_MAX {
                        error_body.extend_from_slice(data);
                    }
                    return Ok(data.len());
                }
                match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        storage_error = Some(e);
                        Ok(0)
                    }
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = performed {
            let _ = fs::remove_file(&part);
            if e.is_write_error() {
                if let Some(io_err) = storage_error {
                    return Err(ClientError::Io(io_err));
                }
            }
            return Err(ClientError::Transport(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            let _ = fs::remove_file(&part);
            return Err(ClientError::from_response(code, &error_body));
        }

        let finished = file.flush().and_then(|()| {
            drop(file);
            fs::rename(&part, dest)
        });
        if let Err(e) = finished {
            let _ = fs::remove_file(&part);
            return Err(ClientError::Io(e));
        }
        tracing::info!(dest = %dest.display(), bytes = written, "file saved");
        Ok(written)
    }
}

/// Events without an `event:` field (or named `message`) carry progress.
fn is_default_event(event: Option<&str>) -> bool {
    matches!(event, None | Some("") | Some("message"))
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Status code from an `HTTP/x.y NNN reason` line; other header lines give `None`.
fn status_from_header_line(line: &str) -> Option<u32> {
    let line = line.trim_end();
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}
