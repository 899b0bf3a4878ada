//! Client-side file name for a finished download.

/// Title used when the backend returned none.
const DEFAULT_TITLE: &str = "video";

/// Maximum characters kept from the title.
const TITLE_MAX: usize = 50;

/// Replaces each run of characters outside `[A-Za-z0-9_-]` with a single `_`.
pub fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Builds `<safe title>_<resolution>_<tag>.mp4`.
///
/// The title is sanitized and cut to 50 characters; the resolution is
/// sanitized the same way so a label like `audio only` stays one token.
pub fn client_filename(title: Option<&str>, resolution: &str, tag: &str) -> String {
    let title = title.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TITLE);
    let safe_title: String = sanitize_component(title).chars().take(TITLE_MAX).collect();
    let resolution = match sanitize_component(resolution) {
        r if r.is_empty() => "unknown".to_string(),
        r => r,
    };
    format!("{}_{}_{}.mp4", safe_title, resolution, tag)
}
