//! End-to-end pipeline tests against a mock provider.
//!
//! These exercise the full fetch → extract → merge → aggregate path for
//! both adapter variants, including failure isolation and deterministic
//! reassembly.

use httpmock::prelude::*;
use reqwest::Client;

use canonsmith::pipeline::FetchScheduler;
use canonsmith::sources::{AdapterVariant, SourceProfile};
use canonsmith::types::BookMeta;

fn rendered_page(book: &str, chapter: u32, verses: &[(u32, &str)]) -> String {
    let mut body = String::new();
    for (number, text) in verses {
        body.push_str(&format!(
            r#"<span class="verse" data-usfm="{book}.{chapter}.{number}">{number} {text}</span>"#
        ));
    }
    format!("<!DOCTYPE html><html><body><div class=\"chapter\">{body}</div></body></html>")
}

fn embedded_payload(book: &str, chapter: u32, verses: &[(u32, &str)]) -> String {
    let mut html = String::new();
    for (number, text) in verses {
        html.push_str(&format!(
            r#"<span data-usfm="{book}.{chapter}.{number}"><span class="label">{number}</span><span class="content">{text}</span></span>"#
        ));
    }
    serde_json::json!({ "content": html }).to_string()
}

fn rendered_scheduler(server: &MockServer) -> FetchScheduler {
    let profile = SourceProfile::new(
        AdapterVariant::Rendered,
        "1840",
        format!("{}/bible/{{code}}/{{book}}.{{chapter}}", server.base_url()),
    );
    FetchScheduler::new(Client::new(), profile)
}

fn embedded_scheduler(server: &MockServer) -> FetchScheduler {
    let profile = SourceProfile::new(
        AdapterVariant::Embedded,
        "1840",
        format!(
            "{}/api/chapter/{{code}}/{{book}}.{{chapter}}",
            server.base_url()
        ),
    );
    FetchScheduler::new(Client::new(), profile)
}

#[tokio::test]
async fn failed_chapter_leaves_gap_and_failure_record() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bible/1840/GEN.1");
        then.status(200).body(rendered_page(
            "GEN",
            1,
            &[(1, "In the beginning"), (2, "And the earth")],
        ));
    });
    server.mock(|when, then| {
        when.method(GET).path("/bible/1840/GEN.2");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/bible/1840/GEN.3");
        then.status(200)
            .body(rendered_page("GEN", 3, &[(1, "And God said")]));
    });

    let run = rendered_scheduler(&server)
        .fetch_book(&BookMeta::new("GEN", "Genesis", 3))
        .await;

    let numbers: Vec<u32> = run.book.chapters.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 3]);

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].chapter, 2);
    assert_eq!(run.failures[0].kind, "network");

    // Surviving chapters keep fully ordered, non-empty verses.
    let first = &run.book.chapters[0];
    assert_eq!(
        first.verses.iter().map(|v| v.number).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(first.verses[0].text, "In the beginning");
    assert!(first.verses.iter().all(|v| !v.text.trim().is_empty()));
}

#[tokio::test]
async fn unparseable_chapter_is_isolated_as_parse_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bible/1840/JUD.1");
        then.status(200).body("<html><body>no verses here</body></html>");
    });

    let run = rendered_scheduler(&server)
        .fetch_book(&BookMeta::new("JUD", "Jude", 1))
        .await;

    assert!(run.book.chapters.is_empty());
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].kind, "parse");
}

#[tokio::test]
async fn covers_full_chapter_range_exactly_once() {
    let server = MockServer::start();
    for chapter in 1..=5u32 {
        server.mock(|when, then| {
            when.method(GET).path(format!("/bible/1840/PSA.{chapter}"));
            then.status(200)
                .body(rendered_page("PSA", chapter, &[(1, "Blessed is the man")]));
        });
    }

    let mut settled = Vec::new();
    let run = rendered_scheduler(&server)
        .with_concurrency(2)
        .fetch_book_with(&BookMeta::new("PSA", "Psalms", 5), |outcome| {
            settled.push(outcome.chapter_number());
        })
        .await;

    // Every chapter settles exactly once, whatever the completion order.
    settled.sort_unstable();
    assert_eq!(settled, vec![1, 2, 3, 4, 5]);
    assert_eq!(
        run.book.chapters.iter().map(|c| c.number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );
}

#[tokio::test]
async fn adapter_choice_does_not_leak_into_merged_text() {
    let verses: &[(u32, &str)] = &[(1, "In the beginning"), (2, "And the earth was without form")];

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/bible/1840/GEN.1");
        then.status(200).body(rendered_page("GEN", 1, verses));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/chapter/1840/GEN.1");
        then.status(200).body(embedded_payload("GEN", 1, verses));
    });

    let meta = BookMeta::new("GEN", "Genesis", 1);
    let from_rendered = rendered_scheduler(&server).fetch_book(&meta).await;
    let from_embedded = embedded_scheduler(&server).fetch_book(&meta).await;

    assert_eq!(from_rendered.book, from_embedded.book);
    assert_eq!(from_rendered.book.chapters[0].verses[0].text, "In the beginning");
}

#[tokio::test]
async fn rerun_against_unchanged_payloads_is_byte_identical() {
    let server = MockServer::start();
    for chapter in 1..=4u32 {
        server.mock(|when, then| {
            when.method(GET).path(format!("/bible/1840/RUT.{chapter}"));
            then.status(200).body(rendered_page(
                "RUT",
                chapter,
                &[(1, "Now it came to pass"), (2, "in the days")],
            ));
        });
    }

    let scheduler = rendered_scheduler(&server).with_concurrency(3);
    let meta = BookMeta::new("RUT", "Ruth", 4);

    let first = scheduler.fetch_book(&meta).await;
    let second = scheduler.fetch_book(&meta).await;

    let first_bytes = serde_json::to_vec(&first.book).unwrap();
    let second_bytes = serde_json::to_vec(&second.book).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn chapters_remain_strictly_ascending_and_unique() {
    let server = MockServer::start();
    for chapter in 1..=6u32 {
        server.mock(|when, then| {
            when.method(GET).path(format!("/bible/1840/JHN.{chapter}"));
            then.status(200)
                .body(rendered_page("JHN", chapter, &[(1, "In the beginning was the Word")]));
        });
    }

    let run = rendered_scheduler(&server)
        .with_concurrency(6)
        .fetch_book(&BookMeta::new("JHN", "John", 6))
        .await;

    let chapters = &run.book.chapters;
    for pair in chapters.windows(2) {
        assert!(pair[0].number < pair[1].number);
    }
    for chapter in chapters {
        for pair in chapter.verses.windows(2) {
            assert!(pair[0].number < pair[1].number);
        }
    }
}
