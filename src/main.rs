//! # Daily Digest
//!
//! A scheduled content-aggregation pipeline. It pulls items from RSS/Atom
//! feeds, a video search endpoint and plain HTML pages, enriches videos with
//! their transcripts, groups everything by category, asks a language model
//! for a short digest per category and writes the result to one report file.
//!
//! ## Usage
//!
//! ```sh
//! daily_digest -c config.yaml          # run now, then daily at 08:00
//! daily_digest --once                  # run once (CI=true does the same)
//! ```
//!
//! ## Architecture
//!
//! 1. **Config**: YAML sources, output and summary settings ([`config`])
//! 2. **Crawl**: one adapter per source type ([`sources`], [`transcript`])
//! 3. **Group**: items by category, first-seen order ([`models`])
//! 4. **Summarize**: one backend request per category ([`summary`], [`llm`])
//! 5. **Write**: digest, list or JSON report ([`outputs`])
//!
//! [`job`] runs the steps in order and [`scheduler`] repeats the job daily.

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod job;
mod llm;
mod models;
mod outputs;
mod scheduler;
mod sources;
mod summary;
mod transcript;
mod utils;

use cli::Cli;
use config::SummaryConfig;
use job::Job;
use llm::{Backend, LlmBackend};
use sources::{Crawler, build_http_client};
use transcript::{TranscriptFetcher, YouTubeTranscripts};

/// Backend for this run, or `None` when the provider has no credential.
fn backend_for(config: &SummaryConfig) -> Option<LlmBackend> {
    match LlmBackend::from_config(config) {
        Ok(backend) => {
            info!(backend = %backend.label(), "Summarization backend ready");
            Some(backend)
        }
        Err(e) => {
            warn!(error = %e, "Summarization disabled; digests will use fallback text");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Could not listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    let single_run = args.single_run(std::env::var("CI").ok().as_deref());
    info!(config = %args.config.display(), at = %args.at.at, single_run, "daily_digest starting up");

    let crawler = Crawler::new(
        build_http_client()?,
        TranscriptFetcher::new(YouTubeTranscripts::new()?),
    );
    let job = Job::new(args.config.clone(), args.output.clone(), crawler, backend_for);
    let job = &job;

    let start_time = std::time::Instant::now();
    if let Err(e) = scheduler::run(args.at, single_run, move || job.run(), shutdown_signal()).await {
        error!(error = %e, "Job failed");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    Ok(())
}
