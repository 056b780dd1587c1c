//! Error types for each stage of the pipeline.
//!
//! Source and backend errors are contained at their boundaries (see
//! [`crate::sources::Crawler::run`] and [`crate::summary::Summarizer::summarize`]);
//! only [`JobError`] ever escapes a job run.

use thiserror::Error;

/// Failure while fetching or parsing a single source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid CSS selector `{0}`")]
    Selector(String),

    #[error("search results page had no embedded data")]
    MissingSearchData,
}

/// Failure talking to a generative-text backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no credential configured ({0} is not set)")]
    MissingCredential(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The only failures that abort a job run.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
