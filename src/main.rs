//! Command-line surface: download a version's books and write them as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canonsmith::meta::MetadataClient;
use canonsmith::pipeline::{ChapterOutcome, DEFAULT_CONCURRENCY, FetchScheduler};
use canonsmith::sources::{AdapterVariant, SourceProfile};
use canonsmith::types::BookMeta;

const PB_TEMPLATE: &str = "{spinner:.blue} {msg:<24} {wide_bar:.cyan/blue} {pos}/{len}";
const PB_CHARS: &str = "█▓▒░  ";

#[derive(Debug, Parser)]
#[command(
    name = "canonsmith",
    version,
    about = "Download scripture text and assemble verse-addressable JSON books"
)]
struct Args {
    /// Provider code of the version to download.
    book_code: String,

    /// Adapter variant matching the provider's markup.
    #[arg(long, value_enum, default_value = "rendered")]
    source: AdapterVariant,

    /// Output file for the assembled books.
    #[arg(long, short, default_value = "data.json")]
    output: PathBuf,

    /// Maximum chapter fetches in flight against the provider.
    #[arg(long, short, default_value_t = DEFAULT_CONCURRENCY)]
    jobs: usize,

    /// Chapter URL template; understands {code}, {book} and {chapter}.
    #[arg(
        long,
        default_value = "https://www.bible.com/bible/{code}/{book}.{chapter}"
    )]
    chapter_url: String,

    /// Book-list URL template; understands {code}.
    #[arg(long, default_value = "https://www.bible.com/json/bible/books/{code}")]
    books_url: String,

    /// Chapter-list URL template; understands {code} and {book}.
    #[arg(
        long,
        default_value = "https://www.bible.com/json/bible/books/{code}/{book}/chapters"
    )]
    chapters_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let client = Client::builder()
        .user_agent(concat!("canonsmith/", env!("CARGO_PKG_VERSION")))
        .use_rustls_tls()
        .build()
        .context("building http client")?;

    // Metadata failure is fatal: without a book list there is nothing to
    // schedule.
    let metadata = MetadataClient::new(
        client.clone(),
        &args.book_code,
        &args.books_url,
        &args.chapters_url,
    );
    let books_meta = metadata
        .version_books()
        .await
        .context("loading version metadata")?;
    info!(books = books_meta.len(), code = %args.book_code, "version metadata loaded");

    let profile = SourceProfile::new(args.source, &args.book_code, &args.chapter_url);
    let scheduler = FetchScheduler::new(client, profile).with_concurrency(args.jobs);

    let mut books = Vec::with_capacity(books_meta.len());
    let mut failed_chapters = 0usize;
    for meta in &books_meta {
        let bar = chapter_bar(meta);
        let run = scheduler
            .fetch_book_with(meta, |outcome| {
                // Advance on every settled task so the bar always reaches N,
                // failures included.
                bar.inc(1);
                if let ChapterOutcome::Failed(failure) = outcome {
                    bar.println(format!(
                        "✗ {} chapter {}: {}",
                        meta.alias, failure.chapter, failure.message
                    ));
                }
            })
            .await;
        bar.finish_with_message(format!(
            "{} ({}/{} chapters)",
            meta.alias,
            run.book.chapters.len(),
            meta.chapter_count
        ));

        failed_chapters += run.failures.len();
        books.push(run.book);
    }

    let serialized = serde_json::to_vec_pretty(&books).context("serializing books")?;
    fs::write(&args.output, serialized)
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        books = books.len(),
        failed_chapters,
        "run complete"
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn chapter_bar(meta: &BookMeta) -> ProgressBar {
    let bar = ProgressBar::new(u64::from(meta.chapter_count));
    if let Ok(style) = ProgressStyle::with_template(PB_TEMPLATE) {
        bar.set_style(style.progress_chars(PB_CHARS));
    }
    bar.set_message(format!("{} ({})", meta.name, meta.alias));
    bar
}
