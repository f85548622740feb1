//! Provider-specific source adapters.
//!
//! An adapter owns one provider's markup shape: it fetches a chapter's raw
//! payload and extracts an ordered fragment list per verse. Two variants
//! exist, selected once at configuration time via [`SourceProfile`] and
//! injected into the scheduler as `Arc<dyn SourceAdapter>`:
//!
//! * [`embedded::EmbeddedAdapter`] — JSON envelope carrying an HTML fragment.
//! * [`rendered::RenderedAdapter`] — full server-rendered HTML document.
//!
//! Both reject fragments whose verse identifier does not belong to the
//! requested book and chapter, even when the markup query matched them;
//! adjacent-chapter bleed is excluded silently, not treated as an error.

pub mod embedded;
pub mod rendered;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::merge::Cleanup;

pub use embedded::EmbeddedAdapter;
pub use rendered::RenderedAdapter;

/// Errors raised inside a single chapter task.
///
/// Both variants are recovered at the task boundary; neither ever aborts
/// sibling tasks.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection failure or non-success response from the provider.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The payload lacks the structural markers the adapter expects.
    #[error("parse error: {0}")]
    Parse(String),

    /// The profile's URL template expanded to an invalid URL.
    #[error("invalid request url: {0}")]
    Template(#[from] url::ParseError),
}

impl SourceError {
    /// Short tag for failure records and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Network(_) => "network",
            SourceError::Parse(_) => "parse",
            SourceError::Template(_) => "template",
        }
    }
}

/// Which concrete adapter a run uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterVariant {
    /// JSON envelope with an embedded HTML fragment.
    Embedded,
    /// Full server-rendered HTML document.
    Rendered,
}

/// Immutable per-run source configuration.
///
/// Identifies the adapter variant and the chapter URL template. The template
/// understands three placeholders: `{code}` (provider book/version code),
/// `{book}` (book alias) and `{chapter}` (chapter number).
#[derive(Clone, Debug)]
pub struct SourceProfile {
    pub variant: AdapterVariant,
    pub book_code: String,
    pub chapter_url: String,
}

impl SourceProfile {
    pub fn new(
        variant: AdapterVariant,
        book_code: impl Into<String>,
        chapter_url: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            book_code: book_code.into(),
            chapter_url: chapter_url.into(),
        }
    }

    /// Expands the chapter URL template for one `(book alias, chapter)` pair.
    pub fn chapter_url(&self, alias: &str, chapter: u32) -> Result<Url, SourceError> {
        let expanded = self
            .chapter_url
            .replace("{code}", &self.book_code)
            .replace("{book}", alias)
            .replace("{chapter}", &chapter.to_string());
        Ok(Url::parse(&expanded)?)
    }

    /// Instantiates the configured adapter variant.
    pub fn adapter(&self) -> Arc<dyn SourceAdapter> {
        match self.variant {
            AdapterVariant::Embedded => Arc::new(EmbeddedAdapter),
            AdapterVariant::Rendered => Arc::new(RenderedAdapter),
        }
    }
}

/// One provider's fetch + extract capability.
///
/// `extract` returns verse number → ordered fragment list; a `BTreeMap`
/// keeps verses ascending so downstream code never re-sorts within a
/// chapter.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Retrieves one chapter's raw payload.
    ///
    /// Non-success responses are a [`SourceError::Network`], like any
    /// connection failure.
    async fn fetch(&self, client: &Client, url: Url) -> Result<String, SourceError> {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    /// Extracts per-verse fragments for the requested book and chapter.
    fn extract(
        &self,
        payload: &str,
        alias: &str,
        chapter: u32,
    ) -> Result<BTreeMap<u32, Vec<String>>, SourceError>;

    /// Fragment cleanup the merger must apply for this provider's markup.
    fn cleanup(&self) -> Cleanup;
}

/// Parses a composite verse identifier of the form `BOOK.CHAPTER.VERSE`.
///
/// Returns `None` for anything malformed; callers treat that the same as a
/// prefix mismatch and skip the element.
pub(crate) fn parse_verse_id(id: &str) -> Option<(&str, u32, u32)> {
    let mut parts = id.split('.');
    let book = parts.next()?;
    let chapter = parts.next()?.parse().ok()?;
    let verse = parts.next()?.parse().ok()?;
    if parts.next().is_some() || book.is_empty() {
        return None;
    }
    Some((book, chapter, verse))
}

/// `true` when a verse id belongs to the requested book and chapter.
pub(crate) fn id_matches(id_book: &str, id_chapter: u32, alias: &str, chapter: u32) -> bool {
    id_book.eq_ignore_ascii_case(alias) && id_chapter == chapter
}

/// Collapses runs of whitespace in raw markup text to single spaces.
pub(crate) fn squash_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
