//! Version metadata: book lists and chapter counts.
//!
//! The provider exposes JSON endpoints for a version's books and for each
//! book's chapter list. Metadata acquisition happens before any chapter
//! task is scheduled, and unlike chapter fetches it is fatal on failure:
//! with no book list there is nothing meaningful to schedule.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::types::BookMeta;

/// Fatal errors while acquiring version metadata.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid metadata: {0}")]
    Invalid(String),

    #[error("invalid metadata url: {0}")]
    Template(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BookItem {
    usfm: String,
    human: String,
}

#[derive(Debug, Deserialize)]
struct ChapterItem {
    human: String,
}

/// Client for the provider's books/chapters JSON endpoints.
///
/// URL templates understand `{code}` (version code) and, for the chapters
/// endpoint, `{book}` (book alias).
#[derive(Clone, Debug)]
pub struct MetadataClient {
    client: Client,
    book_code: String,
    books_url: String,
    chapters_url: String,
}

impl MetadataClient {
    pub fn new(
        client: Client,
        book_code: impl Into<String>,
        books_url: impl Into<String>,
        chapters_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            book_code: book_code.into(),
            books_url: books_url.into(),
            chapters_url: chapters_url.into(),
        }
    }

    /// Fetches the full book list for the version, chapter counts included.
    pub async fn version_books(&self) -> Result<Vec<BookMeta>, MetaError> {
        let url = self.expand(&self.books_url, None)?;
        let envelope: ItemsEnvelope<BookItem> =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        if envelope.items.is_empty() {
            return Err(MetaError::Invalid("empty book list".into()));
        }

        let mut books = Vec::with_capacity(envelope.items.len());
        for item in envelope.items {
            let chapter_count = self.chapter_count(&item.usfm).await?;
            debug!(book = %item.usfm, chapters = chapter_count, "book metadata loaded");
            books.push(BookMeta::new(item.usfm, item.human, chapter_count));
        }
        Ok(books)
    }

    /// Derives a book's chapter count from its chapter list.
    pub async fn chapter_count(&self, alias: &str) -> Result<u32, MetaError> {
        let url = self.expand(&self.chapters_url, Some(alias))?;
        let envelope: ItemsEnvelope<ChapterItem> =
            self.client.get(url).send().await?.error_for_status()?.json().await?;
        last_numeric_chapter(&envelope.items)
            .ok_or_else(|| MetaError::Invalid(format!("no numeric chapters listed for {alias}")))
    }

    fn expand(&self, template: &str, alias: Option<&str>) -> Result<Url, MetaError> {
        let mut expanded = template.replace("{code}", &self.book_code);
        if let Some(alias) = alias {
            expanded = expanded.replace("{book}", alias);
        }
        Ok(Url::parse(&expanded)?)
    }
}

/// The chapter list may contain non-numeric entries such as introductions;
/// the count is the last numeric label.
fn last_numeric_chapter(items: &[ChapterItem]) -> Option<u32> {
    items
        .iter()
        .rev()
        .find_map(|item| item.human.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(labels: &[&str]) -> Vec<ChapterItem> {
        labels
            .iter()
            .map(|label| ChapterItem {
                human: label.to_string(),
            })
            .collect()
    }

    #[test]
    fn chapter_count_is_last_numeric_label() {
        assert_eq!(last_numeric_chapter(&items(&["1", "2", "3"])), Some(3));
        assert_eq!(last_numeric_chapter(&items(&["Intro", "1", "2"])), Some(2));
    }

    #[test]
    fn non_numeric_chapter_lists_yield_nothing() {
        assert_eq!(last_numeric_chapter(&items(&["Intro", "Maps"])), None);
        assert_eq!(last_numeric_chapter(&[]), None);
    }
}
