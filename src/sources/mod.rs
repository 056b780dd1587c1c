//! Source adapters: one `fetch` per configured origin type.
//!
//! | Type | Module | Method |
//! |------|--------|--------|
//! | `feed` | [`feed`] | RSS 2.0 / Atom via `quick-xml` |
//! | `video` | [`video`] | search results page, optional transcript enrichment |
//! | `html` | [`html`] | page fetch + [`html::HtmlExtractor`] |
//!
//! [`Crawler::run`] is the failure boundary: whatever goes wrong inside a
//! source is logged and reported as [`SourceOutcome::Failed`], so one bad
//! source never stops the job.

pub mod feed;
pub mod html;
pub mod video;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::models::Item;
use crate::transcript::{TranscriptApi, TranscriptFetcher};
use reqwest::{Client, RequestBuilder};
use tracing::{error, info, instrument};

/// Desktop browser user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Build the HTTP client shared by all adapters.
pub fn build_http_client() -> Result<Client, SourceError> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Send a request and return the body, treating any non-2xx status as an
/// error.
pub(crate) async fn get_text(request: RequestBuilder) -> Result<String, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Result of running one source.
#[derive(Debug)]
pub enum SourceOutcome {
    Fetched(Vec<Item>),
    Failed { reason: String },
}

impl SourceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }

    pub fn count(&self) -> usize {
        match self {
            SourceOutcome::Fetched(items) => items.len(),
            SourceOutcome::Failed { .. } => 0,
        }
    }

    /// Items of a successful fetch; a failed source contributes none.
    pub fn into_items(self) -> Vec<Item> {
        match self {
            SourceOutcome::Fetched(items) => items,
            SourceOutcome::Failed { .. } => Vec::new(),
        }
    }
}

/// Fetches configured sources with a shared client and transcript fetcher.
#[derive(Debug)]
pub struct Crawler<T> {
    http: Client,
    transcripts: TranscriptFetcher<T>,
}

impl<T: TranscriptApi> Crawler<T> {
    pub fn new(http: Client, transcripts: TranscriptFetcher<T>) -> Self {
        Self { http, transcripts }
    }

    /// Dispatch to the adapter for the source's type.
    pub async fn fetch(&self, source: &SourceConfig) -> Result<Vec<Item>, SourceError> {
        match source {
            SourceConfig::Feed(s) => feed::fetch(&self.http, s).await,
            SourceConfig::Video(s) => video::fetch(&self.http, &self.transcripts, s).await,
            SourceConfig::Html(s) => html::fetch(&self.http, &html::LinkExtractor, s).await,
        }
    }

    /// Fetch one source, never failing: errors become
    /// [`SourceOutcome::Failed`] and the item count is capped at the
    /// source's limit.
    #[instrument(level = "info", skip_all, fields(source = %source.name(), kind = source.kind()))]
    pub async fn run(&self, source: &SourceConfig) -> SourceOutcome {
        info!("Starting crawl");
        match self.fetch(source).await {
            Ok(mut items) => {
                items.truncate(source.limit());
                info!(count = items.len(), "Crawl finished");
                SourceOutcome::Fetched(items)
            }
            Err(e) => {
                error!(error = %e, "Crawl failed; source contributes no items");
                SourceOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
