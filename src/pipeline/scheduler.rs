//! Bounded-concurrency chapter fetching with per-task failure isolation.

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::aggregate::{BookRun, assemble_book};
use crate::merge::merge_fragments;
use crate::sources::{SourceAdapter, SourceError, SourceProfile};
use crate::types::{BookMeta, Chapter, Verse};

/// Default number of chapter fetches in flight against the provider.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Ephemeral unit of work: one chapter of one book.
#[derive(Clone, Debug)]
pub struct FetchTask {
    pub alias: String,
    pub chapter: u32,
}

/// Diagnostic record for a chapter whose task failed.
///
/// Failures are logged and surfaced in [`BookRun::failures`]; they never
/// enter the assembled book.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterFailure {
    pub chapter: u32,
    pub kind: &'static str,
    pub message: String,
}

/// What a settled chapter task produced: exactly one of the two.
#[derive(Clone, Debug)]
pub enum ChapterOutcome {
    Fetched(Chapter),
    Failed(ChapterFailure),
}

impl ChapterOutcome {
    pub fn chapter_number(&self) -> u32 {
        match self {
            ChapterOutcome::Fetched(chapter) => chapter.number,
            ChapterOutcome::Failed(failure) => failure.chapter,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, ChapterOutcome::Fetched(_))
    }
}

/// Runs one fetch-extract-merge task per chapter over a semaphore-bounded
/// pool.
///
/// The semaphore is the system's sole backpressure mechanism; no more than
/// the configured width of chapters are in flight concurrently. Errors are
/// caught at the task boundary and converted to [`ChapterFailure`]s, so one
/// bad chapter never cancels its siblings. There is no retry: a failed
/// chapter is absent from that run's output.
pub struct FetchScheduler {
    client: Client,
    profile: Arc<SourceProfile>,
    concurrency: usize,
}

impl FetchScheduler {
    pub fn new(client: Client, profile: SourceProfile) -> Self {
        Self {
            client,
            profile: Arc::new(profile),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Overrides the worker pool width.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetches every chapter of `meta` and assembles the book.
    pub async fn fetch_book(&self, meta: &BookMeta) -> BookRun {
        self.fetch_book_with(meta, |_| {}).await
    }

    /// Like [`fetch_book`](Self::fetch_book), invoking `on_settled` for each
    /// task outcome as it lands (success and failure alike), in completion
    /// order.
    pub async fn fetch_book_with(
        &self,
        meta: &BookMeta,
        mut on_settled: impl FnMut(&ChapterOutcome),
    ) -> BookRun {
        let adapter = self.profile.adapter();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<ChapterOutcome> = JoinSet::new();

        for chapter in 1..=meta.chapter_count {
            let task = FetchTask {
                alias: meta.alias.clone(),
                chapter,
            };
            let client = self.client.clone();
            let profile = Arc::clone(&self.profile);
            let adapter = Arc::clone(&adapter);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    // Only possible if the semaphore is closed; settle as a failure.
                    Err(_) => {
                        return ChapterOutcome::Failed(ChapterFailure {
                            chapter: task.chapter,
                            kind: "scheduler",
                            message: "worker pool closed".into(),
                        });
                    }
                };
                run_task(&client, &profile, adapter.as_ref(), task).await
            });
        }

        // Full drain: the aggregator must never see a partial snapshot.
        let mut outcomes = Vec::with_capacity(meta.chapter_count as usize);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    on_settled(&outcome);
                    outcomes.push(outcome);
                }
                Err(err) => {
                    error!(book = %meta.alias, error = %err, "chapter task aborted");
                }
            }
        }

        assemble_book(meta, outcomes)
    }
}

async fn run_task(
    client: &Client,
    profile: &SourceProfile,
    adapter: &dyn SourceAdapter,
    task: FetchTask,
) -> ChapterOutcome {
    match fetch_chapter(client, profile, adapter, &task).await {
        Ok(chapter) => {
            debug!(
                book = %task.alias,
                chapter = task.chapter,
                verses = chapter.verses.len(),
                "chapter fetched"
            );
            ChapterOutcome::Fetched(chapter)
        }
        Err(err) => {
            warn!(
                book = %task.alias,
                chapter = task.chapter,
                kind = err.kind(),
                error = %err,
                "chapter fetch failed"
            );
            ChapterOutcome::Failed(ChapterFailure {
                chapter: task.chapter,
                kind: err.kind(),
                message: err.to_string(),
            })
        }
    }
}

/// One task body: fetch, extract, merge. The `BTreeMap` from `extract`
/// keeps verses ascending, so the chapter comes out ordered by
/// construction.
async fn fetch_chapter(
    client: &Client,
    profile: &SourceProfile,
    adapter: &dyn SourceAdapter,
    task: &FetchTask,
) -> Result<Chapter, SourceError> {
    let url = profile.chapter_url(&task.alias, task.chapter)?;
    let payload = adapter.fetch(client, url).await?;
    let fragments = adapter.extract(&payload, &task.alias, task.chapter)?;
    let cleanup = adapter.cleanup();

    let verses: Vec<Verse> = fragments
        .into_iter()
        .filter_map(|(number, parts)| {
            merge_fragments(&parts, cleanup).map(|text| Verse { number, text })
        })
        .collect();

    Ok(Chapter {
        number: task.chapter,
        verses,
    })
}
