//! Report rendering and writing.
//!
//! - [`markdown`]: `## <category>` sections with a digest or an item list
//! - [`json`]: the [`Report`] structure serialized as JSON
//!
//! The report file is replaced on every run.

pub mod json;
pub mod markdown;

use crate::config::ReportFormat;
use crate::error::JobError;
use crate::models::Report;
use crate::utils::ensure_parent_dir;
use std::path::Path;
use tracing::{info, instrument};

/// Render `report` in the configured format.
pub fn render(report: &Report, format: ReportFormat) -> Result<String, JobError> {
    Ok(match format {
        ReportFormat::Digest | ReportFormat::List => markdown::report_to_markdown(report),
        ReportFormat::Json => json::report_to_json(report)?,
    })
}

/// Write the rendered report to `path`, creating parent directories and
/// truncating any previous report.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(path: &Path, contents: &str) -> Result<(), JobError> {
    let write_error = |source| JobError::Write {
        path: path.display().to_string(),
        source,
    };
    ensure_parent_dir(path).await.map_err(write_error)?;
    tokio::fs::write(path, contents).await.map_err(write_error)?;
    info!(bytes = contents.len(), "Report written");
    Ok(())
}
