use super::*;
use crate::model::{Format, ProgressEvent};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

/// Backend that replays canned responses and records what it was asked.
#[derive(Default)]
struct ScriptedBackend {
    info: Option<VideoInfo>,
    info_error: Option<String>,
    session: Option<String>,
    events: Vec<ProgressEvent>,
    /// Stream fails like a dropped connection after the events run out.
    drop_stream: bool,
    requests: RefCell<Vec<DownloadRequest>>,
    fetched: RefCell<Vec<(String, PathBuf)>>,
}

impl Backend for ScriptedBackend {
    fn fetch_info(&self, _url: &str) -> Result<VideoInfo, ClientError> {
        if let Some(msg) = &self.info_error {
            return Err(ClientError::Http {
                status: 500,
                message: msg.clone(),
            });
        }
        Ok(self.info.clone().unwrap_or_default())
    }

    fn start_download(&self, request: &DownloadRequest) -> Result<DownloadSession, ClientError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.session {
            Some(id) => Ok(DownloadSession {
                session_id: id.clone(),
            }),
            None => Err(ClientError::MissingSession),
        }
    }

    fn watch_progress(
        &self,
        _session: &DownloadSession,
        on_event: &mut dyn FnMut(ProgressEvent) -> ControlFlow<()>,
    ) -> Result<(), ClientError> {
        for ev in &self.events {
            if on_event(ev.clone()).is_break() {
                return Ok(());
            }
        }
        if self.drop_stream {
            Err(ClientError::ConnectionLost)
        } else {
            Ok(())
        }
    }

    fn fetch_file(&self, download_url: &str, dest: &Path) -> Result<u64, ClientError> {
        self.fetched
            .borrow_mut()
            .push((download_url.to_string(), dest.to_path_buf()));
        Ok(3)
    }
}

fn format(id: Option<&str>, resolution: Option<&str>, size: Option<u64>) -> Format {
    Format {
        format_id: id.map(str::to_string),
        ext: Some("mp4".into()),
        resolution: resolution.map(str::to_string),
        filesize: size,
        ..Format::default()
    }
}

fn sample_info() -> VideoInfo {
    VideoInfo {
        id: Some("abc".into()),
        title: Some("Night Drive: Live!".into()),
        uploader: Some("Band".into()),
        duration: Some(245.0),
        view_count: Some(9001),
        description: Some("d".repeat(450)),
        thumbnail: Some("https://i.example.com/abc.jpg".into()),
        formats: vec![
            format(None, Some("storyboard"), None),
            format(Some("18"), Some("640x360"), Some(2 * 1024 * 1024)),
            format(Some("22"), Some("1280x720"), Some(0)),
        ],
    }
}

fn event(status: ProgressStatus) -> ProgressEvent {
    ProgressEvent {
        status,
        downloaded_bytes: None,
        total_bytes: None,
        speed: None,
        filename: None,
        download_url: None,
        error: None,
    }
}

fn downloading(done: u64, total: u64) -> ProgressEvent {
    ProgressEvent {
        downloaded_bytes: Some(done),
        total_bytes: Some(total),
        ..event(ProgressStatus::Downloading)
    }
}

fn finished(url: &str) -> ProgressEvent {
    ProgressEvent {
        download_url: Some(url.into()),
        filename: Some("server.mp4".into()),
        ..event(ProgressStatus::Finished)
    }
}

fn orchestrator(backend: ScriptedBackend) -> Orchestrator<ScriptedBackend> {
    Orchestrator::new(backend, &ClientConfig::default())
}

#[test]
fn fetch_info_populates_card_and_usable_formats() {
    let mut o = orchestrator(ScriptedBackend {
        info: Some(sample_info()),
        ..ScriptedBackend::default()
    });
    let info = o.fetch_info("  https://example.com/watch?v=abc  ").unwrap();
    assert_eq!(info.id.as_deref(), Some("abc"));

    let v = o.view();
    assert!(v.info_visible);
    assert!(!v.loading);
    assert!(v.download_enabled);
    assert_eq!(v.message, "");
    assert_eq!(v.card.title, "Night Drive: Live!");
    assert_eq!(v.card.uploader, "By Band");
    assert_eq!(v.card.details, "4 min \u{2022} 9001 views");
    assert_eq!(v.card.description.chars().count(), 401);
    assert!(v.card.description.ends_with('\u{2026}'));
    assert_eq!(v.options.len(), 2, "format without id is skipped");
    assert_eq!(v.options[0].format_id, "18");
    assert_eq!(v.options[0].label, "640x360 \u{2022} mp4 \u{2022} 2.00 MB");
    assert_eq!(v.selected.as_deref(), Some("18"));
    assert_eq!(v.size_hint, "Approx size: 2.00 MB");
    assert!(v.alert.is_none());
}

#[test]
fn fetch_info_without_formats_keeps_download_disabled() {
    let mut info = sample_info();
    info.formats = vec![format(None, None, None)];
    info.title = None;
    let mut o = orchestrator(ScriptedBackend {
        info: Some(info),
        ..ScriptedBackend::default()
    });
    o.fetch_info("https://example.com/x").unwrap();
    let v = o.view();
    assert!(v.info_visible);
    assert!(!v.download_enabled);
    assert_eq!(v.message, "No formats available.");
    assert_eq!(v.card.title, "Untitled");
    assert!(v.selected.is_none());
}

#[test]
fn fetch_info_error_sets_message_and_alert() {
    let mut o = orchestrator(ScriptedBackend {
        info_error: Some("Unsupported URL".into()),
        ..ScriptedBackend::default()
    });
    let err = o.fetch_info("https://example.com/x").unwrap_err();
    assert_eq!(err.to_string(), "Unsupported URL");
    assert!(o.info().is_none());
    let v = o.view();
    assert!(!v.info_visible);
    assert!(!v.loading);
    assert!(!v.download_enabled);
    assert_eq!(v.message, "Error: Unsupported URL");
    assert_eq!(
        o.take_alert().as_deref(),
        Some("Error fetching video info: Unsupported URL")
    );
    assert!(o.take_alert().is_none());
}

#[test]
fn fetch_info_rejects_blank_url_without_request() {
    let mut o = orchestrator(ScriptedBackend {
        info_error: Some("should not be called".into()),
        ..ScriptedBackend::default()
    });
    assert!(matches!(o.fetch_info("   "), Err(ClientError::EmptyUrl)));
    assert_eq!(o.take_alert().as_deref(), Some("Paste a video URL first"));
    assert_eq!(o.view().message, "");
}

#[test]
fn select_format_updates_size_hint_only() {
    let mut o = orchestrator(ScriptedBackend {
        info: Some(sample_info()),
        ..ScriptedBackend::default()
    });
    o.fetch_info("https://example.com/x").unwrap();

    o.select_format("22").unwrap();
    assert_eq!(o.view().selected.as_deref(), Some("22"));
    assert_eq!(o.view().size_hint, "Size: Unknown");

    let err = o.select_format("999").unwrap_err();
    assert!(matches!(err, ClientError::UnknownFormat(ref id) if id == "999"));
    assert_eq!(o.view().selected.as_deref(), Some("22"));
    assert!(o.backend().requests.borrow().is_empty());
}

#[test]
fn start_download_follows_progress_to_finished() {
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = Arc::clone(&messages);
    let mut o = orchestrator(ScriptedBackend {
        info: Some(sample_info()),
        session: Some("s-1".into()),
        events: vec![
            event(ProgressStatus::Queued),
            downloading(50, 200),
            ProgressEvent {
                downloaded_bytes: Some(2048),
                ..event(ProgressStatus::Downloading)
            },
            finished("/download/server.mp4"),
            downloading(1, 1),
        ],
        ..ScriptedBackend::default()
    })
    .with_listener(Box::new(move |s: &ViewState| {
        let mut m = seen.lock().unwrap();
        if m.last() != Some(&s.message) {
            m.push(s.message.clone());
        }
    }));

    o.fetch_info("https://example.com/watch?v=abc").unwrap();
    let done = o.start_download("https://example.com/watch?v=abc", "18").unwrap();

    assert_eq!(done.session.session_id, "s-1");
    assert_eq!(done.download_url, "/download/server.mp4");
    assert_eq!(done.filename, "Night_Drive_Live__640x360_ytdlank.mp4");
    assert_eq!(done.server_filename.as_deref(), Some("server.mp4"));

    let req = o.backend().requests.borrow()[0].clone();
    assert_eq!(req.format_id, "18");
    assert_eq!(req.filename.as_deref(), Some("Night_Drive_Live__640x360_ytdlank.mp4"));
    assert_eq!(req.title.as_deref(), Some("Night Drive: Live!"));

    assert_eq!(o.view().message, "Download complete");
    assert!(o.view().download_enabled);
    assert!(o.take_alert().is_none());

    let m = messages.lock().unwrap();
    assert!(m.contains(&"Starting download...".to_string()));
    assert!(m.contains(&"Downloading... 25%".to_string()));
    assert!(m.contains(&"Downloading... 2.00 KB".to_string()));
    // Events after the terminal one are not seen.
    assert!(!m.contains(&"Downloading... 100%".to_string()));
}

#[test]
fn start_download_error_event_rejects() {
    let mut o = orchestrator(ScriptedBackend {
        info: Some(sample_info()),
        session: Some("s-2".into()),
        events: vec![
            downloading(10, 100),
            ProgressEvent {
                error: Some("HTTP Error 403: Forbidden".into()),
                ..event(ProgressStatus::Error)
            },
        ],
        ..ScriptedBackend::default()
    });
    o.fetch_info("https://example.com/x").unwrap();
    let err = o.start_download("https://example.com/x", "22").unwrap_err();
    assert!(matches!(err, ClientError::Server(ref m) if m == "HTTP Error 403: Forbidden"));
    assert_eq!(o.view().message, "Download failed: HTTP Error 403: Forbidden");
    assert_eq!(
        o.take_alert().as_deref(),
        Some("Download failed: HTTP Error 403: Forbidden")
    );
    assert!(o.view().download_enabled);
}

#[test]
fn start_download_error_event_without_text() {
    let mut o = orchestrator(ScriptedBackend {
        session: Some("s".into()),
        events: vec![event(ProgressStatus::Error)],
        ..ScriptedBackend::default()
    });
    let err = o.start_download("https://example.com/x", "18").unwrap_err();
    assert_eq!(err.to_string(), "Download error");
}

#[test]
fn start_download_stream_ending_early_is_connection_lost() {
    let mut o = orchestrator(ScriptedBackend {
        session: Some("s-3".into()),
        events: vec![event(ProgressStatus::Starting), downloading(1, 10)],
        drop_stream: true,
        ..ScriptedBackend::default()
    });
    let err = o.start_download("https://example.com/x", "18").unwrap_err();
    assert!(matches!(err, ClientError::ConnectionLost));
    assert_eq!(
        o.view().message,
        "Download failed: Connection lost or server error"
    );

    let mut o = orchestrator(ScriptedBackend {
        session: Some("s-4".into()),
        events: vec![downloading(1, 10)],
        ..ScriptedBackend::default()
    });
    assert!(matches!(
        o.start_download("https://example.com/x", "18"),
        Err(ClientError::ConnectionLost)
    ));
}

#[test]
fn start_download_missing_session() {
    let mut o = orchestrator(ScriptedBackend::default());
    let err = o.start_download("https://example.com/x", "18").unwrap_err();
    assert!(matches!(err, ClientError::MissingSession));
    assert_eq!(o.view().message, "Download failed: No session ID received");
    assert!(o.view().download_enabled);
}

#[test]
fn start_download_finished_without_url() {
    let mut o = orchestrator(ScriptedBackend {
        session: Some("s".into()),
        events: vec![event(ProgressStatus::Finished)],
        ..ScriptedBackend::default()
    });
    assert!(matches!(
        o.start_download("https://example.com/x", "18"),
        Err(ClientError::MissingDownloadUrl)
    ));
}

#[test]
fn start_download_requires_format() {
    let mut o = orchestrator(ScriptedBackend::default());
    assert!(matches!(
        o.start_download("https://example.com/x", ""),
        Err(ClientError::NoFormatSelected)
    ));
    assert_eq!(o.take_alert().as_deref(), Some("Choose a format"));
    assert!(o.backend().requests.borrow().is_empty());
}

#[test]
fn start_download_without_info_uses_defaults_in_filename() {
    let mut o = orchestrator(ScriptedBackend {
        session: Some("s".into()),
        events: vec![finished("/download/x.mp4")],
        ..ScriptedBackend::default()
    });
    let done = o.start_download("https://example.com/x", "137").unwrap();
    assert_eq!(done.filename, "video_unknown_ytdlank.mp4");
    assert!(o.backend().requests.borrow()[0].title.is_none());
}

#[test]
fn save_file_writes_under_client_name() {
    let mut o = orchestrator(ScriptedBackend {
        session: Some("s".into()),
        events: vec![finished("/download/server.mp4")],
        ..ScriptedBackend::default()
    });
    let done = o.start_download("https://example.com/x", "18").unwrap();
    let dest = o.save_file(&done, Path::new("/tmp/out")).unwrap();
    assert_eq!(dest, Path::new("/tmp/out/video_unknown_ytdlank.mp4"));
    let fetched = o.backend().fetched.borrow();
    assert_eq!(fetched[0].0, "/download/server.mp4");
    assert_eq!(fetched[0].1, dest);
}
