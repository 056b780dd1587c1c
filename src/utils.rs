//! Small helpers shared by the adapters, the summarizer and the job:
//! text truncation and cleanup, environment flag parsing and output
//! directory preparation.

use chrono::{DateTime, Local};
use scraper::Html;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Keep at most `max` characters of `s`, never splitting a character.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Collapse every run of whitespace into a single space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of an HTML fragment: tags dropped, entities decoded,
/// whitespace normalized.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    normalize_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}

/// Interpret an environment-style flag. Unset, empty, `0`, `false`, `no`
/// and `off` are false; anything else is true.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) => !matches!(v.as_str(), "" | "0" | "false" | "no" | "off"),
    }
}

/// Local time formatted for the report header.
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Create the parent directory of `path` if it has one and it is missing.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            debug!(dir = %parent.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}
