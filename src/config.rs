//! YAML configuration: the sources to crawl, where the report goes and
//! which backend writes the digests.
//!
//! ```yaml
//! sources:
//!   - type: feed
//!     name: Hacker News
//!     url: https://news.ycombinator.com/rss
//!     category: Tech
//!   - type: video
//!     name: YouTube AI
//!     query: artificial intelligence
//!     bias: news
//!     limit: 5
//!     category: AI
//! output:
//!   path: daily_news_summary.md
//!   format: digest
//! summary:
//!   provider: openai
//!   model: gpt-4-turbo
//! ```

use crate::error::ConfigError;
use crate::llm::Provider;
use crate::models::DEFAULT_CATEGORY;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.youtube.com/results";
pub const DEFAULT_LINK_SELECTOR: &str = "article a[href], h2 a[href], h3 a[href]";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    pub output: OutputConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// One configured origin, tagged by its `type` key.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    #[serde(alias = "rss")]
    Feed(FeedSource),
    #[serde(alias = "youtube")]
    Video(VideoSource),
    #[serde(alias = "html-future")]
    Html(HtmlSource),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VideoSource {
    pub name: String,
    pub query: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Appended to the query unless the query already mentions it.
    #[serde(default)]
    pub bias: Option<String>,
    #[serde(default = "default_true")]
    pub transcripts: bool,
    /// Primary then secondary transcript language.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HtmlSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_selector")]
    pub selector: String,
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Feed(s) => &s.name,
            SourceConfig::Video(s) => &s.name,
            SourceConfig::Html(s) => &s.name,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            SourceConfig::Feed(s) => &s.category,
            SourceConfig::Video(s) => &s.category,
            SourceConfig::Html(s) => &s.category,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            SourceConfig::Feed(s) => s.limit,
            SourceConfig::Video(s) => s.limit,
            SourceConfig::Html(s) => s.limit,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Feed(_) => "feed",
            SourceConfig::Video(_) => "video",
            SourceConfig::Html(_) => "html",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One LLM digest per category.
    #[default]
    Digest,
    /// Numbered list of the collected items per category.
    List,
    /// The report structure as JSON.
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SummaryConfig {
    #[serde(default)]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    /// Language the digest must be written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Overrides the provider's API base URL.
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            language: default_language(),
            api_base: None,
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "zh-Hans".to_string()]
}

fn default_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.to_string()
}

fn default_selector() -> String {
    DEFAULT_LINK_SELECTOR.to_string()
}

fn default_output_path() -> String {
    "daily_news_summary.md".to_string()
}

fn default_title() -> String {
    "Daily Industry Highlights".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_language() -> String {
    "Chinese".to_string()
}

/// Parse a YAML document and check that every source is usable.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    for source in &config.sources {
        let (field, value) = match source {
            SourceConfig::Feed(s) => ("url", &s.url),
            SourceConfig::Video(s) => ("query", &s.query),
            SourceConfig::Html(s) => ("url", &s.url),
        };
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "source `{}` has an empty `{field}`",
                source.name()
            )));
        }
    }
    if config.output.path.trim().is_empty() {
        return Err(ConfigError::Invalid("output.path is empty".to_string()));
    }
    Ok(config)
}

/// Read and parse the configuration file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let config = parse_config(&yaml)?;
    info!(sources = config.sources.len(), "Loaded configuration");
    Ok(config)
}
