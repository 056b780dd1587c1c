//! Per-category digests.
//!
//! [`Summarizer::summarize`] builds one prompt from a category's items and
//! makes a single backend request. It never fails: an empty category or an
//! unconfigured backend yields [`Digest::Skipped`], a failed request yields
//! [`Digest::Failed`], and both carry fixed fallback text for the report.

use crate::llm::Backend;
use crate::models::Item;
use crate::utils::{truncate_chars, truncate_for_log};
use std::fmt::Write;
use tracing::{debug, error, info, instrument};

/// Items embedded in a prompt.
pub const MAX_PROMPT_ITEMS: usize = 10;
/// Characters of transcript used as an item's snippet.
pub const TRANSCRIPT_SNIPPET_CHARS: usize = 500;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes news.";
pub const FAILED_TEXT: &str = "Summary generation failed.";

/// Outcome of summarizing one category.
#[derive(Debug, Clone, PartialEq)]
pub enum Digest {
    Generated(String),
    /// Nothing to summarize or no backend configured; no request was made.
    Skipped { category: String },
    Failed { reason: String },
}

impl Digest {
    /// Text that goes into the report.
    pub fn text(&self) -> String {
        match self {
            Digest::Generated(text) => text.clone(),
            Digest::Skipped { category } => skipped_text(category),
            Digest::Failed { .. } => FAILED_TEXT.to_string(),
        }
    }
}

pub fn skipped_text(category: &str) -> String {
    format!("No summary available for {category}.")
}

/// Snippet for one item: transcript prefix, else summary, else title.
fn snippet(item: &Item) -> &str {
    match item.transcript.as_deref() {
        Some(t) if !t.is_empty() => truncate_chars(t, TRANSCRIPT_SNIPPET_CHARS),
        _ if !item.summary.is_empty() => item.summary.as_str(),
        _ => item.title.as_str(),
    }
}

/// Build the user prompt for `category` from its first
/// [`MAX_PROMPT_ITEMS`] items.
pub fn build_prompt(category: &str, items: &[Item], language: &str) -> String {
    let mut context = format!("Here are the top trending news items for the category: {category}.\n");
    for (i, item) in items.iter().take(MAX_PROMPT_ITEMS).enumerate() {
        let _ = write!(
            context,
            "Item {}: Title: {}\nContent Snippet: {}\n\n",
            i + 1,
            item.title,
            snippet(item)
        );
    }

    format!(
        r#"You are a professional news editor. I will provide you with raw information about trending items in the "{category}" sector.

Your task is to summarize the core information into a concise list of key developing stories.
Each point should extract the "Key Insight" or "New Development".

Format Requirements:
- Do NOT include links.
- Do NOT list source names like "CNN" or "TechCrunch".
- Use {language} Language strictly.
- Format as a numbered list.
- Keep it to exactly the top 5-10 most important points.
- Style Example:
  1. OpenAI releases new Sora model with improved physics simulation.
  2. Tesla announces breakthrough in 4680 battery production cost reduction.

Input Data:
{context}"#
    )
}

/// Condenses a category's items through an optional backend.
#[derive(Debug)]
pub struct Summarizer<B> {
    backend: Option<B>,
    language: String,
}

impl<B: Backend> Summarizer<B> {
    /// `backend` is `None` when no credential is configured.
    pub fn new(backend: Option<B>, language: impl Into<String>) -> Self {
        Self {
            backend,
            language: language.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    #[instrument(level = "info", skip(self, items), fields(items = items.len()))]
    pub async fn summarize(&self, category: &str, items: &[Item]) -> Digest {
        let backend = match &self.backend {
            Some(backend) if !items.is_empty() => backend,
            _ => {
                info!("Nothing to summarize or no backend configured; skipping");
                return Digest::Skipped {
                    category: category.to_string(),
                };
            }
        };

        let prompt = build_prompt(category, items, &self.language);
        match backend.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => {
                info!(backend = %backend.label(), chars = text.len(), "Digest generated");
                debug!(preview = %truncate_for_log(&text, 200), "Digest preview");
                Digest::Generated(text)
            }
            Err(e) => {
                error!(backend = %backend.label(), error = %e, "Failed to generate summary");
                Digest::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::BackendError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic backend that echoes a fixed reply and counts calls.
    #[derive(Debug, Default)]
    pub(crate) struct StaticBackend {
        pub reply: String,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl StaticBackend {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl Backend for StaticBackend {
        fn label(&self) -> String {
            "static".to_string()
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(BackendError::Malformed("boom".to_string()))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    impl Backend for &StaticBackend {
        fn label(&self) -> String {
            <StaticBackend as Backend>::label(self)
        }

        async fn complete(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
            <StaticBackend as Backend>::complete(self, system, prompt).await
        }
    }

    fn item(title: &str, summary: &str) -> Item {
        Item::new("src", title, "https://example.com", summary, "today")
    }

    #[tokio::test]
    async fn test_empty_items_skip_without_request() {
        let backend = StaticBackend::replying("unused");
        let summarizer = Summarizer::new(Some(&backend), "English");
        let digest = summarizer.summarize("Tech", &[]).await;
        assert_eq!(digest.text(), "No summary available for Tech.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_backend_skips() {
        let summarizer: Summarizer<StaticBackend> = Summarizer::new(None, "English");
        assert!(!summarizer.is_configured());
        let digest = summarizer.summarize("AI", &[item("t", "s")]).await;
        assert_eq!(digest, Digest::Skipped { category: "AI".to_string() });
        assert_eq!(digest.text(), "No summary available for AI.");
    }

    #[tokio::test]
    async fn test_generated_digest() {
        let backend = StaticBackend::replying("1. Something happened");
        let summarizer = Summarizer::new(Some(&backend), "English");
        let digest = summarizer.summarize("Tech", &[item("t", "s")]).await;
        assert_eq!(digest, Digest::Generated("1. Something happened".to_string()));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_is_fixed_text() {
        let backend = StaticBackend::failing();
        let summarizer = Summarizer::new(Some(&backend), "English");
        let digest = summarizer.summarize("Tech", &[item("t", "s")]).await;
        assert!(matches!(digest, Digest::Failed { .. }));
        assert_eq!(digest.text(), FAILED_TEXT);
    }

    #[test]
    fn test_prompt_embeds_at_most_ten_items() {
        let items: Vec<Item> = (1..=12).map(|i| item(&format!("Title {i}"), "s")).collect();
        let prompt = build_prompt("Finance", &items, "Chinese");
        assert!(prompt.contains("Item 10: Title: Title 10"));
        assert!(!prompt.contains("Item 11"));
        assert!(prompt.contains("Use Chinese Language strictly."));
        assert!(prompt.contains("\"Finance\" sector"));
        assert!(prompt.contains("Do NOT include links."));
    }

    #[test]
    fn test_snippet_preference() {
        let with_transcript = item("Title", "summary").with_transcript("x".repeat(900));
        assert_eq!(snippet(&with_transcript).len(), TRANSCRIPT_SNIPPET_CHARS);

        let empty_transcript = item("Title", "summary").with_transcript(String::new());
        assert_eq!(snippet(&empty_transcript), "summary");

        let bare = item("Title", "");
        assert_eq!(snippet(&bare), "Title");
    }
}
