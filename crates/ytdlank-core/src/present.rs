//! Formatting of the strings the view shows.
//!
//! Pure functions; the orchestrator decides when to call them.

use crate::model::{Format, ProgressEvent, VideoInfo};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Placeholder for a missing count in the details line.
const DASH: &str = "\u{2014}";

/// Human-readable size with binary steps and two decimals; `Unknown` for missing or zero.
pub fn human_bytes(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        Some(b) if b > 0 => b,
        _ => return "Unknown".to_string(),
    };
    let mut n = bytes as f64;
    let mut i = 0;
    while n >= 1024.0 && i < UNITS.len() - 1 {
        n /= 1024.0;
        i += 1;
    }
    format!("{:.2} {}", n, UNITS[i])
}

/// Quality shown for a format: resolution, else the extractor's text, else `unknown`.
pub fn format_quality(f: &Format) -> String {
    non_empty(f.resolution.as_deref())
        .or_else(|| non_empty(f.format.as_deref()))
        .unwrap_or("unknown")
        .to_string()
}

/// Option label: `<quality> • <ext> • <size>`.
pub fn format_label(f: &Format) -> String {
    format!(
        "{} \u{2022} {} \u{2022} {}",
        format_quality(f),
        f.ext.as_deref().unwrap_or(""),
        human_bytes(f.known_size())
    )
}

/// Estimated-size line under the format picker.
pub fn size_hint(filesize: Option<u64>) -> String {
    match filesize.filter(|&n| n > 0) {
        Some(n) => format!("Approx size: {}", human_bytes(Some(n))),
        None => "Size: Unknown".to_string(),
    }
}

pub fn uploader_line(info: &VideoInfo) -> String {
    match non_empty(info.uploader.as_deref()) {
        Some(u) => format!("By {}", u),
        None => String::new(),
    }
}

/// `<minutes> min • <views> views`, with a dash for missing or zero values.
pub fn details_line(info: &VideoInfo) -> String {
    let duration = match info.duration.filter(|d| *d > 0.0) {
        Some(d) => format!("{} min", (d / 60.0).round() as u64),
        None => DASH.to_string(),
    };
    let views = match info.view_count.filter(|&v| v > 0) {
        Some(v) => v.to_string(),
        None => DASH.to_string(),
    };
    format!("{} \u{2022} {} views", duration, views)
}

/// First `max_chars` characters of the description, with `…` when cut.
pub fn description_preview(description: Option<&str>, max_chars: usize) -> String {
    let desc = match description {
        Some(d) if !d.is_empty() => d,
        _ => return String::new(),
    };
    match desc.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\u{2026}", &desc[..cut]),
        None => desc.to_string(),
    }
}

/// Status line for a `downloading` event.
pub fn downloading_message(ev: &ProgressEvent) -> String {
    let done = ev.downloaded_bytes.unwrap_or(0);
    match ev.total_bytes.filter(|&t| t > 0) {
        Some(total) => {
            let pct = (done as f64 / total as f64 * 100.0).round() as u64;
            format!("Downloading... {}%", pct)
        }
        None => format!("Downloading... {}", human_bytes(Some(done))),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
