//! Book assembly: the single total-order boundary of the pipeline.

use super::scheduler::{ChapterFailure, ChapterOutcome};
use crate::types::{Book, BookMeta, Chapter};

/// Result of draining every chapter task for one book.
#[derive(Clone, Debug)]
pub struct BookRun {
    pub book: Book,
    /// One record per failed chapter; these chapters are absent from
    /// `book.chapters`.
    pub failures: Vec<ChapterFailure>,
}

impl BookRun {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds the final [`Book`] from the complete set of settled outcomes.
///
/// Completion order carries no meaning; chapters are sorted ascending here
/// and nowhere else. Failed chapters leave gaps rather than placeholders.
pub fn assemble_book(meta: &BookMeta, outcomes: Vec<ChapterOutcome>) -> BookRun {
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut failures: Vec<ChapterFailure> = Vec::new();

    for outcome in outcomes {
        match outcome {
            ChapterOutcome::Fetched(chapter) => chapters.push(chapter),
            ChapterOutcome::Failed(failure) => failures.push(failure),
        }
    }

    // Chapter numbers are unique, so an unstable sort would do; sorting
    // failures as well keeps run reports deterministic.
    chapters.sort_by_key(|chapter| chapter.number);
    failures.sort_by_key(|failure| failure.chapter);

    BookRun {
        book: Book {
            alias: meta.alias.clone(),
            name: meta.name.clone(),
            chapters,
        },
        failures,
    }
}
