//! Generic HTML page adapter.
//!
//! The page is fetched with the shared browser-like client and a fixed
//! timeout, parsed with `scraper`, and handed to an [`HtmlExtractor`].
//! Site-specific scrapers implement that trait; [`LinkExtractor`] is the
//! general-purpose default driven by the source's CSS selector.

use crate::config::HtmlSource;
use crate::error::SourceError;
use crate::models::Item;
use crate::utils::normalize_whitespace;
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a parsed page into items.
pub trait HtmlExtractor {
    fn extract(
        &self,
        document: &Html,
        page_url: &Url,
        source: &HtmlSource,
    ) -> Result<Vec<Item>, SourceError>;
}

/// Collects anchors matching `source.selector`, one item per distinct link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl HtmlExtractor for LinkExtractor {
    fn extract(
        &self,
        document: &Html,
        page_url: &Url,
        source: &HtmlSource,
    ) -> Result<Vec<Item>, SourceError> {
        let selector = Selector::parse(&source.selector)
            .map_err(|_| SourceError::Selector(source.selector.clone()))?;

        let items = document
            .select(&selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?.trim();
                if href.is_empty()
                    || href.starts_with('#')
                    || href.starts_with("javascript:")
                    || href.starts_with("mailto:")
                {
                    return None;
                }
                let url = page_url.join(href).ok()?;
                let text = normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "));
                let title = if text.is_empty() {
                    element.value().attr("title").unwrap_or_default().to_string()
                } else {
                    text
                };
                Some((url.to_string(), title))
            })
            .unique_by(|(url, _)| url.clone())
            .take(source.limit)
            .map(|(url, title)| Item::new(&source.name, title, url, "", ""))
            .collect();
        Ok(items)
    }
}

/// Fetch the page and run `extractor` over it.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.url))]
pub async fn fetch<E: HtmlExtractor>(
    http: &Client,
    extractor: &E,
    source: &HtmlSource,
) -> Result<Vec<Item>, SourceError> {
    let page_url = Url::parse(&source.url)?;
    let body = super::get_text(http.get(page_url.clone()).timeout(FETCH_TIMEOUT)).await?;
    debug!(bytes = body.len(), "Downloaded page");
    extract_from_body(&body, &page_url, extractor, source)
}

fn extract_from_body<E: HtmlExtractor>(
    body: &str,
    page_url: &Url,
    extractor: &E,
    source: &HtmlSource,
) -> Result<Vec<Item>, SourceError> {
    let document = Html::parse_document(body);
    extractor.extract(&document, page_url, source)
}
