//! Fetch scheduling and book aggregation.
//!
//! [`scheduler::FetchScheduler`] runs one task per chapter under a bounded
//! worker pool and drains every outcome before handing the full set to
//! [`aggregate::assemble_book`], the single place where global chapter
//! ordering is established.

pub mod aggregate;
pub mod scheduler;

pub use aggregate::{BookRun, assemble_book};
pub use scheduler::{
    ChapterFailure, ChapterOutcome, DEFAULT_CONCURRENCY, FetchScheduler, FetchTask,
};
