//! The job: load config, crawl every source, group by category, summarize
//! and write the report.
//!
//! Phases run strictly in order:
//!
//! ```text
//! ConfigLoading -> Crawling -> Grouping -> Summarizing -> ReportWriting -> Done
//! ```
//!
//! Failing sources and failing digests are absorbed by their own
//! boundaries. Only an unusable config or an unwritable report aborts the
//! run.

use crate::config::{ReportFormat, SummaryConfig, load_config};
use crate::error::JobError;
use crate::llm::Backend;
use crate::models::{CategoryGroups, Report, ReportSection, SectionBody};
use crate::outputs::{render, write_report};
use crate::sources::{Crawler, SourceOutcome};
use crate::summary::{Digest, Summarizer};
use crate::transcript::TranscriptApi;
use crate::utils::format_timestamp;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ConfigLoading,
    Crawling,
    Grouping,
    Summarizing,
    ReportWriting,
    Done,
}

fn enter(phase: Phase) {
    info!(?phase, "Job phase");
}

/// How one source fared in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub name: String,
    pub items: usize,
    /// Set when the fetch failed.
    pub error: Option<String>,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub report_path: PathBuf,
    pub sources: Vec<SourceReport>,
    /// Categories in report order with their item counts.
    pub categories: Vec<(String, usize)>,
    pub digests_failed: usize,
}

impl JobSummary {
    pub fn total_items(&self) -> usize {
        self.categories.iter().map(|(_, n)| n).sum()
    }
}

/// A runnable job. `backends` builds the summarization backend from the
/// freshly loaded config, returning `None` when it cannot be configured.
pub struct Job<T, F> {
    config_path: PathBuf,
    output_override: Option<PathBuf>,
    crawler: Crawler<T>,
    backends: F,
}

impl<T, F, B> Job<T, F>
where
    T: TranscriptApi,
    F: Fn(&SummaryConfig) -> Option<B>,
    B: Backend,
{
    pub fn new(
        config_path: PathBuf,
        output_override: Option<PathBuf>,
        crawler: Crawler<T>,
        backends: F,
    ) -> Self {
        Self {
            config_path,
            output_override,
            crawler,
            backends,
        }
    }

    #[instrument(level = "info", skip_all, fields(config = %self.config_path.display()))]
    pub async fn run(&self) -> Result<JobSummary, JobError> {
        let started = Instant::now();

        enter(Phase::ConfigLoading);
        let config = load_config(&self.config_path).await?;

        enter(Phase::Crawling);
        if config.sources.is_empty() {
            warn!("No sources configured");
        }
        let mut items = Vec::new();
        let mut sources = Vec::with_capacity(config.sources.len());
        for source in &config.sources {
            let outcome = self.crawler.run(source).await;
            sources.push(SourceReport {
                name: source.name().to_string(),
                items: outcome.count(),
                error: match &outcome {
                    SourceOutcome::Failed { reason } => Some(reason.clone()),
                    SourceOutcome::Fetched(_) => None,
                },
            });
            for mut item in outcome.into_items() {
                item.category = Some(source.category().to_string());
                items.push(item);
            }
        }
        info!(items = items.len(), "Crawl complete");

        enter(Phase::Grouping);
        let groups = CategoryGroups::from_items(items);
        let categories: Vec<(String, usize)> = groups
            .iter()
            .map(|g| (g.category.clone(), g.items.len()))
            .collect();

        enter(Phase::Summarizing);
        let mut digests_failed = 0;
        let sections = match config.output.format {
            ReportFormat::Digest => {
                let summarizer =
                    Summarizer::new((self.backends)(&config.summary), config.summary.language.as_str());
                if !summarizer.is_configured() {
                    warn!("No summarization backend; every category gets fallback text");
                }
                let mut sections = Vec::with_capacity(groups.len());
                for group in groups {
                    info!(category = %group.category, items = group.items.len(), "Summarizing category");
                    let digest = summarizer.summarize(&group.category, &group.items).await;
                    if matches!(digest, Digest::Failed { .. }) {
                        digests_failed += 1;
                    }
                    sections.push(ReportSection {
                        category: group.category,
                        body: SectionBody::Digest(digest.text()),
                    });
                }
                sections
            }
            ReportFormat::List | ReportFormat::Json => groups
                .into_iter()
                .map(|group| ReportSection {
                    category: group.category,
                    body: SectionBody::Items(group.items),
                })
                .collect(),
        };

        enter(Phase::ReportWriting);
        let report = Report {
            title: config.output.title.clone(),
            generated_at: format_timestamp(Local::now()),
            sections,
        };
        let contents = render(&report, config.output.format)?;
        let report_path = self
            .output_override
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.path));
        write_report(&report_path, &contents).await?;

        enter(Phase::Done);
        let summary = JobSummary {
            report_path,
            sources,
            categories,
            digests_failed,
        };
        info!(
            path = %summary.report_path.display(),
            items = summary.total_items(),
            categories = summary.categories.len(),
            failed_sources = summary.sources.iter().filter(|s| s.error.is_some()).count(),
            digests_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job completed"
        );
        Ok(summary)
    }
}
