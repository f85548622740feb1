//! Pure fragment merging for a single verse.
//!
//! Adapters hand the merger an ordered fragment list per verse; the merger
//! applies the adapter's cleanup, joins with single spaces, trims, and drops
//! verses that end up empty (footnote-only or formatting-only nodes).

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading inlined verse-number label: digits, optional punctuation, whitespace.
static VERSE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[[:punct:]]*\s*").expect("verse label pattern"));

/// Provider-specific fragment cleanup, selected by the source adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cleanup {
    /// Fragments are already plain verse text.
    None,
    /// Server-rendered markup inlines the verse number as leading text;
    /// strip it before joining.
    StripVerseLabel,
}

/// Collapses one verse's fragments into its final text.
///
/// Returns `None` when the cleaned, joined text is empty; such verses are
/// dropped rather than emitted or treated as errors.
pub fn merge_fragments(fragments: &[String], cleanup: Cleanup) -> Option<String> {
    let pieces: Vec<&str> = fragments
        .iter()
        .map(|fragment| match cleanup {
            Cleanup::None => fragment.as_str(),
            Cleanup::StripVerseLabel => strip_verse_label(fragment),
        })
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();

    let text = pieces.join(" ");
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Strips a leading "digits, optional punctuation, whitespace" label.
fn strip_verse_label(fragment: &str) -> &str {
    VERSE_LABEL
        .find(fragment)
        .map_or(fragment, |label| &fragment[label.end()..])
}
