//! Video search adapter.
//!
//! Runs a free-text query against the search results page, reads the
//! embedded `ytInitialData` JSON and turns each `videoRenderer` into an
//! [`Item`]. When enabled, every video is enriched with its transcript.

use crate::config::VideoSource;
use crate::error::SourceError;
use crate::models::{Item, NO_TITLE, UNKNOWN_DATE};
use crate::transcript::{TranscriptApi, TranscriptFetcher};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const UNKNOWN_VIEWS: &str = "Unknown Views";
const UNKNOWN_CHANNEL: &str = "Unknown Channel";

static INITIAL_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)(?:var\s+ytInitialData|window\["ytInitialData"\])\s*=\s*(\{.+?\})\s*;\s*</script>"#)
        .expect("ytInitialData pattern")
});

/// One search hit before it becomes an [`Item`].
#[derive(Debug, Clone, PartialEq)]
pub struct VideoResult {
    pub video_id: Option<String>,
    pub title: String,
    pub published: String,
    pub views: String,
    pub channel: String,
    pub thumbnail: Option<String>,
}

impl VideoResult {
    pub fn link(&self) -> String {
        match &self.video_id {
            Some(id) => format!("{WATCH_URL}{id}"),
            None => String::new(),
        }
    }

    fn into_item(self, source_name: &str) -> Item {
        let summary = format!(
            "Channel: {} | Views: {} | Posted: {}",
            self.channel, self.views, self.published
        );
        let mut item = Item::new(source_name, &self.title, self.link(), summary, &self.published);
        item.thumbnail = self.thumbnail;
        item.video_id = self.video_id;
        item.channel = Some(self.channel);
        item.views = Some(self.views);
        item
    }
}

/// Append `bias` to `query` unless the query already contains it.
pub fn effective_query(query: &str, bias: Option<&str>) -> String {
    let query = query.trim();
    match bias.map(str::trim).filter(|b| !b.is_empty()) {
        Some(bias) if !query.to_lowercase().contains(&bias.to_lowercase()) => {
            format!("{query} {bias}")
        }
        _ => query.to_string(),
    }
}

/// Search for videos and enrich them with transcripts when configured.
#[instrument(level = "info", skip_all, fields(source = %source.name, query = %source.query))]
pub async fn fetch<T: TranscriptApi>(
    http: &Client,
    transcripts: &TranscriptFetcher<T>,
    source: &VideoSource,
) -> Result<Vec<Item>, SourceError> {
    let query = effective_query(&source.query, source.bias.as_deref());
    let url = format!(
        "{}?search_query={}",
        source.endpoint.trim_end_matches('?'),
        urlencoding::encode(&query)
    );
    debug!(%url, "Searching videos");

    let page = super::get_text(http.get(&url).header("Accept-Language", "en-US,en;q=0.9")).await?;
    let results = parse_search_page(&page, source.limit)?;
    info!(count = results.len(), "Parsed video search results");

    let mut items = Vec::with_capacity(results.len());
    for result in results {
        let mut item = result.into_item(&source.name);
        if source.transcripts {
            let text = match item.video_id.as_deref() {
                Some(id) => transcripts.get_transcript(id, &source.languages).await,
                None => String::new(),
            };
            debug!(video = %item.url, chars = text.chars().count(), "Transcript attached");
            item = item.with_transcript(text);
        }
        items.push(item);
    }
    Ok(items)
}

/// Extract up to `limit` results from a search results page.
pub fn parse_search_page(html: &str, limit: usize) -> Result<Vec<VideoResult>, SourceError> {
    let json = INITIAL_DATA
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or(SourceError::MissingSearchData)?;
    let data: Value = serde_json::from_str(json.as_str())?;

    let mut renderers = Vec::new();
    collect_renderers(&data, &mut renderers);
    Ok(renderers
        .into_iter()
        .take(limit)
        .map(video_from_renderer)
        .collect())
}

fn collect_renderers<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "videoRenderer" {
                    out.push(child);
                } else {
                    collect_renderers(child, out);
                }
            }
        }
        Value::Array(values) => values.iter().for_each(|v| collect_renderers(v, out)),
        _ => {}
    }
}

/// Text of a `{"simpleText": ..}` or `{"runs": [{"text": ..}]}` node.
fn text_of(node: &Value) -> Option<String> {
    node["simpleText"]
        .as_str()
        .or_else(|| node["runs"][0]["text"].as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn video_from_renderer(r: &Value) -> VideoResult {
    VideoResult {
        video_id: r["videoId"].as_str().map(str::to_string),
        title: text_of(&r["title"]).unwrap_or_else(|| NO_TITLE.to_string()),
        published: text_of(&r["publishedTimeText"]).unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        views: text_of(&r["shortViewCountText"])
            .or_else(|| text_of(&r["viewCountText"]))
            .unwrap_or_else(|| UNKNOWN_VIEWS.to_string()),
        channel: text_of(&r["ownerText"])
            .or_else(|| text_of(&r["longBylineText"]))
            .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string()),
        thumbnail: r["thumbnail"]["thumbnails"][0]["url"]
            .as_str()
            .map(str::to_string),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::NO_URL;
    use crate::transcript::tests::FakeTranscripts;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn renderer(id: &str, title: &str) -> Value {
        json!({
            "videoRenderer": {
                "videoId": id,
                "title": { "runs": [{ "text": title }] },
                "publishedTimeText": { "simpleText": "3 hours ago" },
                "shortViewCountText": { "simpleText": "12K views" },
                "ownerText": { "runs": [{ "text": "Rust Channel" }] },
                "thumbnail": { "thumbnails": [{ "url": format!("https://i.ytimg.com/vi/{id}/hq.jpg") }] }
            }
        })
    }

    /// A results page embedding `count` videos plus one bare renderer.
    pub(crate) fn search_page(count: usize) -> String {
        let mut contents: Vec<Value> = (0..count)
            .map(|i| renderer(&format!("vid{i}"), &format!("Video {i}")))
            .collect();
        contents.insert(1, json!({ "adSlotRenderer": { "id": "ad" } }));
        contents.push(json!({ "videoRenderer": {} }));
        let data = json!({
            "contents": { "twoColumnSearchResultsRenderer": { "primaryContents": {
                "sectionListRenderer": { "contents": [
                    { "itemSectionRenderer": { "contents": contents } }
                ] }
            } } }
        });
        format!(
            "<html><head><script>var ytInitialData = {data};</script></head><body></body></html>"
        )
    }

    fn source(endpoint: String, limit: usize, transcripts: bool) -> VideoSource {
        VideoSource {
            name: "YouTube".to_string(),
            query: "rust".to_string(),
            category: "Tech".to_string(),
            limit,
            bias: Some("news".to_string()),
            transcripts,
            languages: vec!["en".to_string()],
            endpoint,
        }
    }

    #[test]
    fn test_effective_query() {
        assert_eq!(effective_query("rust", Some("news")), "rust news");
        assert_eq!(effective_query("Rust News today", Some("news")), "Rust News today");
        assert_eq!(effective_query(" rust ", None), "rust");
        assert_eq!(effective_query("rust", Some("  ")), "rust");
    }

    #[test]
    fn test_parse_search_page() {
        let results = parse_search_page(&search_page(2), 10).unwrap();
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].video_id.as_deref(), Some("vid0"));
        assert_eq!(results[0].title, "Video 0");
        assert_eq!(results[0].link(), "https://www.youtube.com/watch?v=vid0");
        assert_eq!(results[0].views, "12K views");
        assert_eq!(results[0].channel, "Rust Channel");
        assert_eq!(results[0].published, "3 hours ago");
        assert_eq!(
            results[0].thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/vid0/hq.jpg")
        );

        let bare = &results[2];
        assert_eq!(bare.title, NO_TITLE);
        assert_eq!(bare.published, UNKNOWN_DATE);
        assert_eq!(bare.views, UNKNOWN_VIEWS);
        assert_eq!(bare.channel, UNKNOWN_CHANNEL);
        assert_eq!(bare.thumbnail, None);

        let item = bare.clone().into_item("YouTube");
        assert_eq!(item.url, NO_URL);
    }

    #[test]
    fn test_sibling_renderers_keep_page_order() {
        let html = r#"<script>var ytInitialData = {"zeta": {"videoRenderer": {"videoId": "first"}}, "alpha": {"videoRenderer": {"videoId": "second"}}};</script>"#;
        let ids: Vec<Option<String>> = parse_search_page(html, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.video_id)
            .collect();
        assert_eq!(ids, vec![Some("first".to_string()), Some("second".to_string())]);
    }

    #[test]
    fn test_parse_search_page_limit() {
        assert_eq!(parse_search_page(&search_page(5), 3).unwrap().len(), 3);
    }

    #[test]
    fn test_page_without_data() {
        let err = parse_search_page("<html></html>", 5).unwrap_err();
        assert!(matches!(err, SourceError::MissingSearchData));
    }

    #[tokio::test]
    async fn test_fetch_with_failing_transcripts_keeps_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/results"))
            .and(query_param("search_query", "rust news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(search_page(4)))
            .mount(&server)
            .await;

        let fetcher = TranscriptFetcher::new(FakeTranscripts::failing());
        let src = source(format!("{}/results", server.uri()), 3, true);
        let items = fetch(&Client::new(), &fetcher, &src).await.unwrap();

        assert_eq!(items.len(), 3);
        for item in &items {
            assert_eq!(item.source, "YouTube");
            assert!(item.url.starts_with(WATCH_URL));
            assert_eq!(item.channel.as_deref(), Some("Rust Channel"));
            assert_eq!(item.views.as_deref(), Some("12K views"));
            assert_eq!(
                item.summary,
                "Channel: Rust Channel | Views: 12K views | Posted: 3 hours ago"
            );
            assert_eq!(item.transcript.as_deref(), Some(""));
            assert_eq!(item.has_transcript, Some(false));
        }
    }

    #[tokio::test]
    async fn test_fetch_attaches_transcripts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(search_page(1)))
            .mount(&server)
            .await;

        let fetcher = TranscriptFetcher::new(FakeTranscripts::default().with("en", false, "hello there"));
        let items = fetch(&Client::new(), &fetcher, &source(server.uri(), 1, true))
            .await
            .unwrap();
        assert_eq!(items[0].transcript.as_deref(), Some("hello there"));
        assert_eq!(items[0].has_transcript, Some(true));

        let plain = fetch(&Client::new(), &fetcher, &source(server.uri(), 1, false))
            .await
            .unwrap();
        assert_eq!(plain[0].transcript, None);
        assert_eq!(plain[0].has_transcript, None);
    }
}
