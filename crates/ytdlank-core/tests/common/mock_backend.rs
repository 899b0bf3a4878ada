//! Minimal HTTP/1.1 server that plays the download backend for integration tests.
//!
//! Serves canned responses for `/api/info` and `/api/download`, streams canned
//! events on `/api/progress` as `text/event-stream`, and serves one file under
//! `/download/`. Every request is recorded.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Status and body for `POST /api/info`.
    pub info: (u16, String),
    /// Status and body for `POST /api/download`.
    pub download: (u16, String),
    /// JSON payloads sent as `data:` events, in order; the stream then closes.
    /// An entry that already ends in a blank line is written as a raw frame.
    pub events: Vec<String>,
    /// Replaces the event stream with a plain status and JSON body.
    pub progress: Option<(u16, String)>,
    /// Body of `GET /download/<name>`; `None` answers 404.
    pub file: Option<Vec<u8>>,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            info: (200, "{}".to_string()),
            download: (200, r#"{"session_id": "sess-1"}"#.to_string()),
            events: Vec::new(),
            progress: None,
            file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including query string.
    pub target: String,
    pub body: String,
}

pub struct MockBackend {
    pub url: String,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn recorded(&self, method: &str, path_prefix: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.target.starts_with(path_prefix))
            .cloned()
            .collect()
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start(opts: MockOptions) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let opts = Arc::new(opts);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let recorded = Arc::clone(&recorded);
            thread::spawn(move || handle(stream, &opts, &recorded));
        }
    });
    MockBackend {
        url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

fn handle(mut stream: TcpStream, opts: &MockOptions, recorded: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(r) => r,
        None => return,
    };
    recorded.lock().unwrap().push(request.clone());

    let path = request.target.split('?').next().unwrap_or("");
    match (request.method.as_str(), path) {
        ("POST", "/api/info") => respond_json(&mut stream, opts.info.0, &opts.info.1),
        ("POST", "/api/download") => respond_json(&mut stream, opts.download.0, &opts.download.1),
        ("GET", "/api/progress") => match &opts.progress {
            Some((status, body)) => respond_json(&mut stream, *status, body),
            None => stream_events(&mut stream, &opts.events),
        },
        ("GET", p) if p.starts_with("/download/") => match &opts.file {
            Some(body) => {
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(body);
            }
            None => respond_json(&mut stream, 404, r#"{"error": "File not found"}"#),
        },
        _ => respond_json(&mut stream, 404, r#"{"error": "not found"}"#),
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

fn respond_json(stream: &mut TcpStream, status: u16, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Writes each event in two pieces to exercise chunk reassembly on the client.
fn stream_events(stream: &mut TcpStream, events: &[String]) {
    let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    let _ = stream.write_all(b": connected\n\n");
    for payload in events {
        let frame = if payload.ends_with("\n\n") {
            payload.clone()
        } else {
            format!("data: {}\n\n", payload)
        };
        let (a, b) = frame.as_bytes().split_at(frame.len() / 2);
        if stream.write_all(a).is_err() {
            return;
        }
        let _ = stream.flush();
        thread::sleep(Duration::from_millis(10));
        if stream.write_all(b).is_err() {
            return;
        }
        let _ = stream.flush();
        thread::sleep(Duration::from_millis(10));
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..end]).into_owned();
    Some(RecordedRequest {
        method,
        target,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
