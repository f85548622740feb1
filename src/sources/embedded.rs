//! Embedded-document adapter: JSON envelope carrying an HTML fragment.
//!
//! The provider answers chapter requests with a JSON body whose `content`
//! field holds chapter markup. Verse elements carry a composite identifier
//! in their `data-usfm` attribute (`BOOK.CHAPTER.VERSE`); the verse's text
//! lives in nested `content`-classed sub-elements, collected in document
//! order as that verse's fragments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::{SourceAdapter, SourceError, id_matches, parse_verse_id, squash_whitespace};
use crate::merge::Cleanup;

/// JSON envelope around the chapter markup.
#[derive(Debug, Deserialize)]
struct ChapterEnvelope {
    content: String,
}

/// Adapter for providers that embed chapter HTML inside a JSON payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedAdapter;

#[async_trait]
impl SourceAdapter for EmbeddedAdapter {
    fn extract(
        &self,
        payload: &str,
        alias: &str,
        chapter: u32,
    ) -> Result<BTreeMap<u32, Vec<String>>, SourceError> {
        let envelope: ChapterEnvelope = serde_json::from_str(payload)
            .map_err(|err| SourceError::Parse(format!("invalid chapter envelope: {err}")))?;

        let document = Html::parse_fragment(&envelope.content);
        let verse_selector = Selector::parse("[data-usfm]")
            .map_err(|err| SourceError::Parse(format!("verse selector: {err}")))?;
        let content_selector = Selector::parse(".content")
            .map_err(|err| SourceError::Parse(format!("content selector: {err}")))?;

        let mut seen_marker = false;
        let mut verses: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for element in document.select(&verse_selector) {
            seen_marker = true;
            let Some(id) = element.value().attr("data-usfm") else {
                continue;
            };
            // Malformed ids and adjacent-chapter bleed are skipped, not errors.
            let Some((id_book, id_chapter, verse)) = parse_verse_id(id) else {
                continue;
            };
            if !id_matches(id_book, id_chapter, alias, chapter) {
                continue;
            }

            // A verse split across several elements keeps one fragment list.
            let fragments = verses.entry(verse).or_default();
            for content in element.select(&content_selector) {
                let text = squash_whitespace(&content.text().collect::<String>());
                fragments.push(text);
            }
        }

        if !seen_marker {
            return Err(SourceError::Parse(
                "no verse markers found in chapter markup".into(),
            ));
        }
        Ok(verses)
    }

    fn cleanup(&self) -> Cleanup {
        Cleanup::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(html: &str) -> String {
        serde_json::json!({ "content": html }).to_string()
    }

    #[test]
    fn extracts_fragments_in_document_order() {
        let payload = envelope(concat!(
            r#"<div class="chapter">"#,
            r#"<span data-usfm="GEN.1.1"><span class="label">1</span>"#,
            r#"<span class="content">In the beginning</span></span>"#,
            r#"<span data-usfm="GEN.1.2"><span class="content">And the earth</span>"#,
            r#"<span class="content">was without form</span></span>"#,
            r#"</div>"#,
        ));
        let verses = EmbeddedAdapter.extract(&payload, "GEN", 1).unwrap();
        assert_eq!(verses[&1], vec!["In the beginning".to_string()]);
        assert_eq!(
            verses[&2],
            vec!["And the earth".to_string(), "was without form".to_string()]
        );
    }

    #[test]
    fn verse_split_across_elements_merges_fragment_lists() {
        let payload = envelope(concat!(
            r#"<p data-usfm="GEN.1.3"><span class="content">And God said,</span></p>"#,
            r#"<p data-usfm="GEN.1.3"><span class="content">Let there be light</span></p>"#,
        ));
        let verses = EmbeddedAdapter.extract(&payload, "GEN", 1).unwrap();
        assert_eq!(
            verses[&3],
            vec!["And God said,".to_string(), "Let there be light".to_string()]
        );
    }

    #[test]
    fn excludes_ids_outside_requested_chapter() {
        let payload = envelope(concat!(
            r#"<span data-usfm="GEN.1.1"><span class="content">kept</span></span>"#,
            r#"<span data-usfm="GEN.2.5"><span class="content">bleed</span></span>"#,
            r#"<span data-usfm="EXO.1.1"><span class="content">wrong book</span></span>"#,
        ));
        let verses = EmbeddedAdapter.extract(&payload, "GEN", 1).unwrap();
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[&1], vec!["kept".to_string()]);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = EmbeddedAdapter.extract("<html>", "GEN", 1).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn markup_without_verse_markers_is_a_parse_error() {
        let payload = envelope("<div><p>maintenance page</p></div>");
        let err = EmbeddedAdapter.extract(&payload, "GEN", 1).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
