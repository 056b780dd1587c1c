//! RSS 2.0 and Atom feed adapter.
//!
//! Entries are read with `quick-xml` in a single pass. Each `<item>` (RSS) or
//! `<entry>` (Atom) becomes an [`Item`]; fields missing upstream fall back to
//! the [`Item::new`] defaults instead of failing the entry.

use crate::config::FeedSource;
use crate::error::SourceError;
use crate::models::Item;
use crate::utils::{normalize_whitespace, strip_html};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;
use tracing::{debug, instrument};

/// Download the feed and map its first `limit` entries to items.
#[instrument(level = "info", skip_all, fields(source = %source.name, url = %source.url))]
pub async fn fetch(http: &Client, source: &FeedSource) -> Result<Vec<Item>, SourceError> {
    let body = super::get_text(http.get(&source.url)).await?;
    debug!(bytes = body.len(), "Downloaded feed");
    parse_feed(&body, &source.name, source.limit)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Summary,
    Date,
}

/// Map an element name to the entry field it feeds and its priority
/// (lower wins when several elements feed the same field).
fn field_for(name: &str) -> Option<(Field, u8)> {
    match name {
        "title" => Some((Field::Title, 0)),
        "link" => Some((Field::Link, 0)),
        "description" | "summary" => Some((Field::Summary, 0)),
        "content:encoded" | "content" => Some((Field::Summary, 1)),
        "pubDate" | "published" => Some((Field::Date, 0)),
        "updated" | "dc:date" => Some((Field::Date, 1)),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Entry {
    title: Option<(u8, String)>,
    link: Option<(u8, String)>,
    summary: Option<(u8, String)>,
    date: Option<(u8, String)>,
    thumbnail: Option<String>,
}

impl Entry {
    fn set(&mut self, field: Field, rank: u8, value: String) {
        if value.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Summary => &mut self.summary,
            Field::Date => &mut self.date,
        };
        if slot.as_ref().is_none_or(|(current, _)| rank < *current) {
            *slot = Some((rank, value));
        }
    }

    /// Pick up attribute-carried data: Atom `<link href>`, media thumbnails
    /// and image enclosures.
    fn absorb_attributes(&mut self, name: &str, e: &BytesStart<'_>) {
        match name {
            "link" => {
                let rel = attr(e, b"rel");
                if let Some(href) = attr(e, b"href") {
                    if rel.as_deref().is_none_or(|r| r == "alternate") {
                        self.set(Field::Link, 0, href);
                    }
                }
            }
            "media:thumbnail" | "media:content" if self.thumbnail.is_none() => {
                self.thumbnail = attr(e, b"url");
            }
            "enclosure" if self.thumbnail.is_none() => {
                if attr(e, b"type").is_some_and(|t| t.starts_with("image/")) {
                    self.thumbnail = attr(e, b"url");
                }
            }
            _ => {}
        }
    }

    fn into_item(self, source_name: &str) -> Item {
        let value = |slot: Option<(u8, String)>| slot.map(|(_, v)| v).unwrap_or_default();
        let mut item = Item::new(
            source_name,
            normalize_whitespace(&value(self.title)),
            value(self.link).trim(),
            strip_html(&value(self.summary)),
            normalize_whitespace(&value(self.date)),
        );
        item.thumbnail = self.thumbnail;
        item
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(a.value.as_ref()).trim().to_string())
        .filter(|v| !v.is_empty())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Parse an RSS or Atom document into at most `limit` items.
pub fn parse_feed(xml: &str, source_name: &str, limit: usize) -> Result<Vec<Item>, SourceError> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut entry: Option<Entry> = None;
    // Field being captured, with elements nested inside it (xhtml content).
    let mut active: Option<(Field, u8)> = None;
    let mut nested = 0usize;
    let mut text = String::new();

    if limit == 0 {
        return Ok(items);
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                if name == "item" || name == "entry" {
                    entry = Some(Entry::default());
                    active = None;
                    continue;
                }
                let Some(current) = entry.as_mut() else {
                    continue;
                };
                if active.is_some() {
                    nested += 1;
                    continue;
                }
                current.absorb_attributes(&name, &e);
                if let Some(field) = field_for(&name) {
                    active = Some(field);
                    nested = 0;
                    text.clear();
                }
            }
            Event::Empty(e) => {
                if let (Some(current), None) = (entry.as_mut(), active) {
                    current.absorb_attributes(&element_name(&e), &e);
                }
            }
            Event::Text(e) => {
                if active.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::CData(e) => {
                if active.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if active.is_some() {
                    match e.resolve_char_ref() {
                        Ok(Some(ch)) => text.push(ch),
                        _ => {
                            let name = String::from_utf8_lossy(&e).into_owned();
                            match resolve_predefined_entity(&name) {
                                Some(resolved) => text.push_str(resolved),
                                None => {
                                    text.push('&');
                                    text.push_str(&name);
                                    text.push(';');
                                }
                            }
                        }
                    }
                }
            }
            Event::End(e) => {
                if let Some((field, rank)) = active {
                    if nested > 0 {
                        nested -= 1;
                    } else {
                        if let Some(current) = entry.as_mut() {
                            current.set(field, rank, text.trim().to_string());
                        }
                        active = None;
                    }
                    continue;
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "item" || name == "entry" {
                    if let Some(done) = entry.take() {
                        items.push(done.into_item(source_name));
                        if items.len() >= limit {
                            break;
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}
