//! Markdown rendering of a [`Report`].
//!
//! ```text
//! # Daily Industry Highlights
//! Generated at: 2025-05-06 08:00:00
//!
//! ## Tech
//! 1. [Title](https://example.com/a)
//!    Hacker News | Tue, 06 May 2025
//! ```

use crate::models::{Item, Report, SectionBody};
use crate::utils::truncate_chars;
use itertools::Itertools;
use std::fmt::Write;

/// Characters of an item's summary shown under it in list reports.
const LIST_SUMMARY_CHARS: usize = 300;

/// Render the whole report. Only the `Generated at` line depends on the
/// clock, so identical inputs render identically otherwise.
pub fn report_to_markdown(report: &Report) -> String {
    let mut md = String::new();
    writeln!(md, "# {}", report.title).unwrap();
    writeln!(md, "Generated at: {}", report.generated_at).unwrap();
    writeln!(md).unwrap();

    for section in &report.sections {
        writeln!(md, "## {}", section.category).unwrap();
        match &section.body {
            SectionBody::Digest(text) => writeln!(md, "{}", text.trim_end()).unwrap(),
            SectionBody::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    write_item(&mut md, i + 1, item);
                }
            }
        }
        writeln!(md).unwrap();
    }
    md
}

fn write_item(md: &mut String, number: usize, item: &Item) {
    writeln!(md, "{}. [{}]({})", number, item.title, item.url).unwrap();
    if let Some(thumbnail) = item.thumbnail.as_deref().filter(|t| !t.is_empty()) {
        writeln!(md, "   ![thumbnail]({})", thumbnail).unwrap();
    }

    let details = [
        Some(item.source.as_str()),
        Some(item.date.as_str()),
        item.channel.as_deref(),
        item.views.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|d| !d.is_empty())
    .join(" | ");
    writeln!(md, "   {}", details).unwrap();

    // Video summaries only repeat the details line.
    if item.channel.is_none() && !item.summary.is_empty() {
        writeln!(md, "   {}", truncate_chars(&item.summary, LIST_SUMMARY_CHARS)).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportSection;

    fn report(sections: Vec<ReportSection>) -> Report {
        Report {
            title: "Daily".to_string(),
            generated_at: "2025-05-06 08:00:00".to_string(),
            sections,
        }
    }

    #[test]
    fn test_digest_sections() {
        let md = report_to_markdown(&report(vec![
            ReportSection {
                category: "Tech".to_string(),
                body: SectionBody::Digest("1. A\n2. B\n".to_string()),
            },
            ReportSection {
                category: "AI".to_string(),
                body: SectionBody::Digest("No summary available for AI.".to_string()),
            },
        ]));
        assert_eq!(
            md,
            "# Daily\nGenerated at: 2025-05-06 08:00:00\n\n## Tech\n1. A\n2. B\n\n## AI\nNo summary available for AI.\n\n"
        );
    }

    #[test]
    fn test_item_list_section() {
        let article = Item::new("HN", "Rust 2024", "https://e.com/r", "Edition released", "Tue");
        let mut video = Item::new("YouTube", "Talk", "https://youtu.be/x", "Channel: C | Views: 1K | Posted: 1 day ago", "1 day ago");
        video.thumbnail = Some("https://i.ytimg.com/x.jpg".to_string());
        video.channel = Some("C".to_string());
        video.views = Some("1K".to_string());

        let md = report_to_markdown(&report(vec![ReportSection {
            category: "Tech".to_string(),
            body: SectionBody::Items(vec![article, video]),
        }]));

        assert!(md.contains("1. [Rust 2024](https://e.com/r)\n   HN | Tue\n   Edition released\n"));
        assert!(md.contains(
            "2. [Talk](https://youtu.be/x)\n   ![thumbnail](https://i.ytimg.com/x.jpg)\n   YouTube | 1 day ago | C | 1K\n"
        ));
        assert!(!md.contains("Channel: C"));
        assert_eq!(md.matches("\n## ").count(), 1);
    }
}
