//! Data models shared across the pipeline.
//!
//! - [`Item`]: one normalized content unit produced by a source adapter
//! - [`CategoryGroups`]: items partitioned by category, in first-seen order
//! - [`Report`]: the rendered artifact of one job run

use serde::Serialize;

pub const NO_TITLE: &str = "No Title";
pub const NO_URL: &str = "#";
pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const DEFAULT_CATEGORY: &str = "General";

/// A normalized content record.
///
/// `title`, `url` and `date` are never empty: [`Item::new`] substitutes
/// [`NO_TITLE`], [`NO_URL`] and [`UNKNOWN_DATE`] for missing upstream values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    /// Name of the source that produced the item.
    pub source: String,
    pub title: String,
    pub url: String,
    /// Short descriptive text, possibly empty.
    pub summary: String,
    /// Publication time as reported upstream, or [`UNKNOWN_DATE`].
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<String>,
    /// Transcript text, bounded in length. Only set on video items when
    /// enrichment ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_transcript: Option<bool>,
    /// Attached by the job after fetching, never by an adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Item {
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            title: or_fallback(title.into(), NO_TITLE),
            url: or_fallback(url.into(), NO_URL),
            summary: summary.into().trim().to_string(),
            date: or_fallback(date.into(), UNKNOWN_DATE),
            thumbnail: None,
            video_id: None,
            channel: None,
            views: None,
            transcript: None,
            has_transcript: None,
            category: None,
        }
    }

    /// Attach the transcript and its presence flag together.
    pub fn with_transcript(mut self, transcript: String) -> Self {
        self.has_transcript = Some(!transcript.is_empty());
        self.transcript = Some(transcript);
        self
    }

    /// Category attached during the job, or [`DEFAULT_CATEGORY`].
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

fn or_fallback(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Items of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<Item>,
}

/// Items partitioned by category, categories in first-seen order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CategoryGroups {
    groups: Vec<CategoryGroup>,
}

impl CategoryGroups {
    /// Partition `items` by [`Item::category`]. Item order within a group
    /// follows input order.
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for item in items {
            match groups.iter_mut().find(|g| g.category == item.category()) {
                Some(group) => group.items.push(item),
                None => groups.push(CategoryGroup {
                    category: item.category().to_string(),
                    items: vec![item],
                }),
            }
        }
        Self { groups }
    }

    pub fn get(&self, category: &str) -> Option<&[Item]> {
        self.groups
            .iter()
            .find(|g| g.category == category)
            .map(|g| g.items.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup> {
        self.groups.iter()
    }
}

impl IntoIterator for CategoryGroups {
    type Item = CategoryGroup;
    type IntoIter = std::vec::IntoIter<CategoryGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Body of one report section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionBody {
    /// Numbered list of the items themselves.
    Items(Vec<Item>),
    /// Condensed text produced by the summarizer (or its fallback).
    Digest(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub category: String,
    pub body: SectionBody,
}

/// The output document of one job run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub generated_at: String,
    pub sections: Vec<ReportSection>,
}
