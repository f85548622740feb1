//! Concurrent scripture retrieval pipeline.
//!
//! ```text
//! meta::MetadataClient ──► BookMeta {alias, name, chapter_count}
//!                                    │
//!                                    ▼
//! pipeline::FetchScheduler ──► one FetchTask per chapter (bounded pool)
//!          │                         │
//!          │          sources::SourceAdapter::fetch ──► raw payload
//!          │          sources::SourceAdapter::extract ──► verse ► fragments
//!          │          merge::merge_fragments ──► Verse text
//!          │                         │
//!          └──► ChapterOutcome (Chapter or ChapterFailure, order unspecified)
//!                                    │
//!                                    ▼
//! pipeline::assemble_book ──► Book with chapters ascending, gaps for failures
//! ```
//!
//! A failed chapter never aborts its siblings: the error is logged and the
//! chapter is simply absent from the assembled [`types::Book`]. Global
//! ordering exists only past the aggregator; nothing upstream may rely on
//! completion order.

pub mod merge;
pub mod meta;
pub mod pipeline;
pub mod sources;
pub mod types;

pub use pipeline::{BookRun, ChapterFailure, ChapterOutcome, FetchScheduler};
pub use sources::{AdapterVariant, SourceAdapter, SourceError, SourceProfile};
pub use types::{Book, BookMeta, Chapter, Verse};
