//! Wire types for the backend API.
//!
//! Every field the backend may leave out is optional; extraction backends are
//! loose about what they fill in.

use serde::{Deserialize, Serialize};

/// Metadata returned by `POST /api/info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Thumbnail URL.
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formats: Vec<Format>,
}

/// One downloadable encoding/resolution variant of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Format {
    /// Unique per video. Formats without one cannot be requested.
    #[serde(default)]
    pub format_id: Option<String>,
    /// Free-text description from the extractor (e.g. "137 - 1920x1080 (1080p)").
    #[serde(default)]
    pub format: Option<String>,
    /// Container extension.
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub fps: Option<f64>,
    /// Size in bytes; `0` means unknown.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
}

impl Format {
    /// File size if the backend knows it.
    pub fn known_size(&self) -> Option<u64> {
        self.filesize.filter(|&n| n > 0)
    }
}

/// Body of `POST /api/download`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Server-assigned handle correlating a download request with its progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSession {
    pub session_id: String,
}

/// Raw `POST /api/download` response; `session_id` may be missing on a broken backend.
#[derive(Debug, Deserialize)]
pub(crate) struct DownloadResponse {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Queued,
    Starting,
    Downloading,
    Finished,
    Error,
    #[serde(other)]
    Unknown,
}

impl ProgressStatus {
    /// `finished` and `error` end the stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStatus::Finished | ProgressStatus::Error)
    }
}

/// One payload of the `/api/progress` event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub downloaded_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_bytes: Option<u64>,
    /// Bytes per second as reported by the backend.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Server-side file name once finished.
    #[serde(default)]
    pub filename: Option<String>,
    /// Relative URL of the finished file.
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Format>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Format>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
    Int(u64),
    Float(f64),
}

/// Byte and view counts may arrive as floats (`1048576.0`); those are truncated.
/// Negative or non-finite values read as unknown.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Int(n)) => Some(n),
        Some(Count::Float(f)) if f.is_finite() && f >= 0.0 => Some(f as u64),
        _ => None,
    })
}
