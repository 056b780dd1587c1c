//! Transcript enrichment for video items.
//!
//! [`TranscriptFetcher::get_transcript`] walks a fixed preference cascade
//! and always returns text, possibly empty: a video without captions is a
//! normal outcome, not an error.
//!
//! 1. manually created transcript in the primary language, then the secondary
//! 2. auto-generated transcript in the primary language
//! 3. the first transcript the video lists, in any language

use crate::utils::{normalize_whitespace, truncate_chars};
use std::error::Error;
use std::fmt;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Upper bound on transcript length, in characters.
pub const MAX_TRANSCRIPT_CHARS: usize = 8000;

const DEFAULT_PRIMARY: &str = "en";

pub type TranscriptResult = Result<TranscriptTrack, Box<dyn Error + Send + Sync>>;

/// One transcript as returned by a [`TranscriptApi`].
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptTrack {
    pub language_code: String,
    pub is_generated: bool,
    pub text: String,
}

/// Transcript lookup for a single video.
pub trait TranscriptApi {
    /// Return the transcript for the first of `languages` that has one.
    /// Manually created transcripts are preferred over generated ones
    /// within a language.
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> TranscriptResult;

    /// Language codes of every transcript the video has, in listing order.
    async fn available_languages(
        &self,
        video_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;
}

/// Applies the language cascade and length bound on top of a
/// [`TranscriptApi`].
#[derive(Debug)]
pub struct TranscriptFetcher<T> {
    api: T,
}

impl<T: TranscriptApi> TranscriptFetcher<T> {
    pub fn new(api: T) -> Self {
        Self { api }
    }

    /// Transcript text for `video_id`, or an empty string when none could be
    /// retrieved. `languages` holds the primary then secondary language.
    #[instrument(level = "debug", skip(self, languages))]
    pub async fn get_transcript(&self, video_id: &str, languages: &[String]) -> String {
        let primary = languages.first().map(String::as_str).unwrap_or(DEFAULT_PRIMARY);
        let secondary = languages.get(1).map(String::as_str);

        let primary_track = match self.api.fetch(video_id, &[primary]).await {
            Ok(track) => Some(track),
            Err(e) => {
                debug!(language = primary, error = %e, "No transcript in primary language");
                None
            }
        };
        if let Some(track) = primary_track.as_ref().filter(|t| !t.is_generated) {
            return finish(&track.text);
        }

        if let Some(secondary) = secondary {
            match self.api.fetch(video_id, &[secondary]).await {
                Ok(track) if !track.is_generated => return finish(&track.text),
                Ok(_) => debug!(language = secondary, "Only a generated transcript in secondary language"),
                Err(e) => debug!(language = secondary, error = %e, "No transcript in secondary language"),
            }
        }

        if let Some(track) = primary_track {
            return finish(&track.text);
        }

        let listed = match self.api.available_languages(video_id).await {
            Ok(listed) => listed,
            Err(e) => {
                debug!(error = %e, "Could not list transcripts");
                return String::new();
            }
        };
        for language in &listed {
            match self.api.fetch(video_id, &[language.as_str()]).await {
                Ok(track) => {
                    debug!(language = %track.language_code, "Using fallback transcript");
                    return finish(&track.text);
                }
                Err(e) => debug!(%language, error = %e, "Listed transcript could not be fetched"),
            }
        }
        debug!("No transcript available");
        String::new()
    }
}

fn finish(text: &str) -> String {
    let text = normalize_whitespace(text);
    truncate_chars(&text, MAX_TRANSCRIPT_CHARS).to_string()
}

/// [`TranscriptApi`] backed by YouTube caption tracks.
pub struct YouTubeTranscripts {
    api: YouTubeTranscriptApi,
}

impl YouTubeTranscripts {
    pub fn new() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| e.to_string())?;
        Ok(Self { api })
    }
}

impl fmt::Debug for YouTubeTranscripts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeTranscripts").finish_non_exhaustive()
    }
}

impl TranscriptApi for YouTubeTranscripts {
    async fn fetch(&self, video_id: &str, languages: &[&str]) -> TranscriptResult {
        let fetched = self
            .api
            .fetch_transcript(video_id, languages, false)
            .await
            .map_err(|e| e.to_string())?;
        Ok(TranscriptTrack {
            language_code: fetched.language_code.clone(),
            is_generated: fetched.is_generated,
            text: fetched.text(),
        })
    }

    async fn available_languages(
        &self,
        video_id: &str,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let list = self
            .api
            .list_transcripts(video_id)
            .await
            .map_err(|e| e.to_string())?;
        Ok(list
            .transcripts()
            .map(|t| t.language_code.clone())
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// In-memory transcripts keyed by language code.
    #[derive(Debug, Default)]
    pub(crate) struct FakeTranscripts {
        pub tracks: HashMap<String, TranscriptTrack>,
        pub fail: bool,
    }

    impl FakeTranscripts {
        pub fn with(mut self, language: &str, is_generated: bool, text: &str) -> Self {
            self.tracks.insert(
                language.to_string(),
                TranscriptTrack {
                    language_code: language.to_string(),
                    is_generated,
                    text: text.to_string(),
                },
            );
            self
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl TranscriptApi for FakeTranscripts {
        async fn fetch(&self, _video_id: &str, languages: &[&str]) -> TranscriptResult {
            if self.fail {
                return Err("internal error while listing captions".into());
            }
            languages
                .iter()
                .find_map(|lang| self.tracks.get(*lang).cloned())
                .ok_or_else(|| "no transcript found".into())
        }

        async fn available_languages(
            &self,
            _video_id: &str,
        ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
            if self.fail {
                return Err("internal error while listing captions".into());
            }
            let mut listed: Vec<String> = self.tracks.keys().cloned().collect();
            listed.sort();
            Ok(listed)
        }
    }

    fn langs() -> Vec<String> {
        vec!["en".to_string(), "zh-Hans".to_string()]
    }

    #[tokio::test]
    async fn test_prefers_manual_primary() {
        let api = FakeTranscripts::default()
            .with("en", false, "english manual")
            .with("zh-Hans", false, "chinese manual");
        let fetcher = TranscriptFetcher::new(api);
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "english manual");
    }

    #[tokio::test]
    async fn test_manual_secondary_beats_generated_primary() {
        let api = FakeTranscripts::default()
            .with("en", true, "english auto")
            .with("zh-Hans", false, "chinese manual");
        let fetcher = TranscriptFetcher::new(api);
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "chinese manual");
    }

    #[tokio::test]
    async fn test_generated_primary_when_no_manual() {
        let api = FakeTranscripts::default()
            .with("en", true, "english auto")
            .with("zh-Hans", true, "chinese auto");
        let fetcher = TranscriptFetcher::new(api);
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "english auto");
    }

    #[tokio::test]
    async fn test_any_language_as_last_resort() {
        let api = FakeTranscripts::default().with("pt-BR", true, "ola mundo");
        let fetcher = TranscriptFetcher::new(api);
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "ola mundo");

        let regional = FakeTranscripts::default()
            .with("es-419", false, "hola")
            .with("en-IN", true, "hello");
        let fetcher = TranscriptFetcher::new(regional);
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "hello");
    }

    #[tokio::test]
    async fn test_failure_yields_empty_string() {
        let fetcher = TranscriptFetcher::new(FakeTranscripts::failing());
        assert_eq!(fetcher.get_transcript("vid", &langs()).await, "");

        let none = TranscriptFetcher::new(FakeTranscripts::default());
        assert_eq!(none.get_transcript("vid", &[]).await, "");
    }

    #[tokio::test]
    async fn test_transcript_is_bounded_and_normalized() {
        let long = "word\n ".repeat(5000);
        let api = FakeTranscripts::default().with("en", false, &long);
        let text = TranscriptFetcher::new(api).get_transcript("vid", &langs()).await;
        assert_eq!(text.chars().count(), MAX_TRANSCRIPT_CHARS);
        assert!(!text.contains('\n'));
    }
}
