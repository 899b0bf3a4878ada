//! Access to the download backend.
//!
//! The orchestrator only talks to [`Backend`]; [`HttpBackend`] is the real
//! implementation over libcurl, tests substitute scripted ones.

mod http;

pub use http::HttpBackend;

use crate::error::ClientError;
use crate::model::{DownloadRequest, DownloadSession, ProgressEvent, VideoInfo};
use std::ops::ControlFlow;
use std::path::Path;

pub trait Backend {
    /// `POST /api/info {url}`.
    fn fetch_info(&self, url: &str) -> Result<VideoInfo, ClientError>;

    /// `POST /api/download`; fails with [`ClientError::MissingSession`] if no id comes back.
    fn start_download(&self, request: &DownloadRequest) -> Result<DownloadSession, ClientError>;

    /// Streams `GET /api/progress?session=<id>` into `on_event` until it returns
    /// `Break` (Ok) or the stream ends first ([`ClientError::ConnectionLost`]).
    fn watch_progress(
        &self,
        session: &DownloadSession,
        on_event: &mut dyn FnMut(ProgressEvent) -> ControlFlow<()>,
    ) -> Result<(), ClientError>;

    /// Fetches the finished file at `download_url` (relative to the backend) into `dest`.
    /// Returns the number of bytes written.
    fn fetch_file(&self, download_url: &str, dest: &Path) -> Result<u64, ClientError>;
}
