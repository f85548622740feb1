//! Server-rendered adapter: full HTML documents with inlined verse labels.
//!
//! Older provider pages render the whole chapter as one HTML document.
//! Verse elements carry the composite identifier directly in `data-usfm`
//! and inline the verse number as leading text, so each fragment is the
//! element's raw text and the merger strips the label downstream.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{SourceAdapter, SourceError, id_matches, parse_verse_id, squash_whitespace};
use crate::merge::Cleanup;

/// Adapter for providers that serve chapters as server-rendered pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderedAdapter;

#[async_trait]
impl SourceAdapter for RenderedAdapter {
    fn extract(
        &self,
        payload: &str,
        alias: &str,
        chapter: u32,
    ) -> Result<BTreeMap<u32, Vec<String>>, SourceError> {
        let document = Html::parse_document(payload);
        let verse_selector = Selector::parse("[data-usfm]")
            .map_err(|err| SourceError::Parse(format!("verse selector: {err}")))?;

        let mut seen_marker = false;
        let mut verses: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for element in document.select(&verse_selector) {
            seen_marker = true;
            let Some(id) = element.value().attr("data-usfm") else {
                continue;
            };
            let Some((id_book, id_chapter, verse)) = parse_verse_id(id) else {
                continue;
            };
            if !id_matches(id_book, id_chapter, alias, chapter) {
                continue;
            }

            // Raw element text, label still attached; the merger strips it.
            let text = squash_whitespace(&element.text().collect::<String>());
            verses.entry(verse).or_default().push(text);
        }

        if !seen_marker {
            return Err(SourceError::Parse(
                "no verse markers found in rendered page".into(),
            ));
        }
        Ok(verses)
    }

    fn cleanup(&self) -> Cleanup {
        Cleanup::StripVerseLabel
    }
}
