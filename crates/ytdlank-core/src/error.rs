//! Client error type.
//!
//! `Display` is the text shown to the user; front ends prefix it
//! (`Error: ...`, `Download failed: ...`) rather than reformatting it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// libcurl failed before a usable response arrived.
    #[error("{0}")]
    Transport(#[from] curl::Error),

    /// Non-2xx response. `message` is the backend's `error` field or raw body.
    #[error("{message}")]
    Http { status: u32, message: String },

    /// Response or event payload was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// `/api/download` answered 2xx but without a `session_id`.
    #[error("No session ID received")]
    MissingSession,

    /// The backend reported `status: error` on the progress stream.
    #[error("{0}")]
    Server(String),

    /// The progress stream closed before a terminal event.
    #[error("Connection lost or server error")]
    ConnectionLost,

    /// A `finished` event arrived without a `download_url`.
    #[error("download finished without a file URL")]
    MissingDownloadUrl,

    #[error("Paste a video URL first")]
    EmptyUrl,

    #[error("Choose a format")]
    NoFormatSelected,

    #[error("unknown format: {0}")]
    UnknownFormat(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Builds an HTTP error from a response body, preferring a JSON `{"error": ...}` message.
    pub fn from_response(status: u32, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body).trim().to_string();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(text);
        let message = if message.is_empty() {
            format!("Server returned {}", status)
        } else {
            message
        };
        ClientError::Http { status, message }
    }
}
