//! Core data model for retrieved scripture.
//!
//! The serde shapes here are the crate's wire format: a [`Book`] serializes
//! as `{"book": alias, "name": name, "chapters": [...]}` with chapters and
//! verses strictly ascending by number.

use serde::{Deserialize, Serialize};

/// A single verse: positive number plus non-empty merged text.
///
/// Produced by the fragment merger; immutable afterwards. Verse numbers are
/// unique within a chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

/// One chapter's verses, ascending by verse number.
///
/// A chapter is created whole by a single fetch task; a task either yields a
/// complete `Chapter` or nothing at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub number: u32,
    pub verses: Vec<Verse>,
}

/// An assembled book: chapters ascending by number, gaps permitted where a
/// chapter's task failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// USFM-style alias, e.g. `GEN`.
    #[serde(rename = "book")]
    pub alias: String,
    /// Human-readable name, e.g. `Genesis`.
    pub name: String,
    pub chapters: Vec<Chapter>,
}

/// Per-book metadata the scheduler needs before any chapter task runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMeta {
    pub alias: String,
    pub name: String,
    pub chapter_count: u32,
}

impl BookMeta {
    pub fn new(alias: impl Into<String>, name: impl Into<String>, chapter_count: u32) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            chapter_count,
        }
    }
}
