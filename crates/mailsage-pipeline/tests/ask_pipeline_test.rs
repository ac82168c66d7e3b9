//! End-to-end pipeline tests over the fixture mailbox and mock generation
//! backend.

use std::sync::Arc;

use chrono::{Duration, Utc};

use mailsage_core::{InMemoryStore, MailFolder, MailProvider, MemoryStore, Question};
use mailsage_inference::MockGenerationBackend;
use mailsage_mail::{FixtureMailbox, FixtureMessage};
use mailsage_pipeline::AskPipeline;

fn yesterday_rfc2822() -> String {
    (Utc::now() - Duration::days(1)).to_rfc2822()
}

fn pipeline(
    mailbox: FixtureMailbox,
    generation: MockGenerationBackend,
) -> (AskPipeline, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let pipeline = AskPipeline::new(
        Arc::new(mailbox),
        Arc::new(generation),
        store.clone(),
    );
    (pipeline, store)
}

#[tokio::test]
async fn scenario_a_yesterday_invoice_question() {
    let mailbox = FixtureMailbox::new().with_message(
        FixtureMessage::new("m1", MailFolder::Inbox)
            .subject("Invoice #102")
            .from("Billing <billing@acme.example>")
            .to("user@example.com")
            .date(yesterday_rfc2822())
            .snippet("Your invoice is attached")
            .body_text("Please find invoice #102 attached. Total due 420.00."),
    );
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["invoice"]}"#)
        .with_mapping(
            "Answer the question using only",
            r#"{"answer": "One invoice arrived yesterday: Invoice #102.", "citations": ["m1"]}"#,
        );

    let (pipeline, _) = pipeline(mailbox, generation);
    let outcome = pipeline
        .ask(&Question::new("show me yesterday's emails about invoice", "u1"))
        .await
        .unwrap();

    assert!(outcome.messages.iter().any(|m| m.id == "m1"));
    assert!(outcome.queries.iter().any(|q| q.contains("after:")));
    assert_eq!(outcome.answer, "One invoice arrived yesterday: Invoice #102.");
    assert!(outcome.action.kind().is_none());
}

#[tokio::test]
async fn scenario_b_send_to_email_literal() {
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["in:inbox"]}"#)
        .with_mapping(
            "Answer the question using only",
            r#"{"answer": "Drafting a thank-you note."}"#,
        );

    let (pipeline, _) = pipeline(FixtureMailbox::new(), generation);
    let outcome = pipeline
        .ask(&Question::new(
            "send an email to priya@example.com saying thanks",
            "u1",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.action.kind(), Some("send"));
    let send = outcome.action.send().unwrap();
    assert_eq!(send.to_email, "priya@example.com");
    assert_eq!(send.subject, "Quick note");
    assert_eq!(send.body, "Drafting a thank-you note.");
    assert!(outcome.messages.is_empty());
}

#[tokio::test]
async fn scenario_c_forced_summary_becomes_answer() {
    let long_body = "Your July account statement is ready. ".repeat(40);
    let mailbox = FixtureMailbox::new().with_message(
        FixtureMessage::new("h1", MailFolder::Inbox)
            .subject("HDFC statement")
            .from("HDFC Bank <alerts@hdfcbank.example>")
            .to("user@example.com")
            .date("Wed, 5 Aug 2026 10:00:00 +0000")
            .body_text(long_body),
    );
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["from:hdfc"]}"#)
        .with_mapping(
            "factual summary",
            r#"{"summary": "July statement is ready; nothing is due."}"#,
        )
        .with_mapping("Answer the question using only", r#"{"answer": "No answer"}"#);

    let (pipeline, _) = pipeline(mailbox, generation);
    let outcome = pipeline
        .ask(&Question::new("summarize the latest email from hdfc", "u1"))
        .await
        .unwrap();

    assert_eq!(
        outcome.forced_summary.as_deref(),
        Some("July statement is ready; nothing is due.")
    );
    assert_eq!(outcome.answer, "July statement is ready; nothing is due.");
}

#[tokio::test]
async fn scenario_d_empty_mailbox_deterministic_fallback() {
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["in:inbox"]}"#)
        .with_mapping("Answer the question using only", r#"{"answer": "No answer"}"#);

    let (pipeline, _) = pipeline(FixtureMailbox::new(), generation);
    let outcome = pipeline
        .ask(&Question::new("find emails from last month", "u1"))
        .await
        .unwrap();

    assert!(outcome.answer.contains("within last month"));
    assert!(outcome.messages.is_empty());
    assert_eq!(outcome.action.kind(), None);
}

#[tokio::test]
async fn scenario_e_invalid_answer_json_repaired() {
    let mailbox = FixtureMailbox::new().with_message(
        FixtureMessage::new("m1", MailFolder::Inbox)
            .subject("Quarterly report")
            .from("Reports <reports@acme.example>")
            .to("user@example.com")
            .date("Wed, 5 Aug 2026 10:00:00 +0000")
            .body_text("The quarterly report is attached for review."),
    );
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["report"]}"#)
        .with_mapping("Answer the question using only", "sorry, here you go <<<")
        .with_mapping(
            "Summarize this message for the user",
            r#"{"summary": "The quarterly report arrived from Acme."}"#,
        );

    let (pipeline, _) = pipeline(mailbox, generation);
    let outcome = pipeline
        .ask(&Question::new("anything about the report?", "u1"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "The quarterly report arrived from Acme.");
    assert!(outcome.messages.iter().any(|m| m.id == "m1"));
}

#[tokio::test]
async fn memory_capture_is_independent_of_search() {
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["in:inbox"]}"#)
        .with_mapping(
            "Answer the question using only",
            r#"{"answer": "Noted."}"#,
        );

    let (pipeline, store) = pipeline(FixtureMailbox::new(), generation);
    pipeline
        .ask(&Question::new("remember my landlord: Ravi, flat 4B", "u1"))
        .await
        .unwrap();

    let notes = store.find_notes("u1", 10).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].key, "my landlord");
    assert_eq!(notes[0].value, "Ravi, flat 4B");
}

#[tokio::test]
async fn at_most_four_generation_calls_per_request() {
    let mailbox = FixtureMailbox::new().with_message(
        FixtureMessage::new("h1", MailFolder::Inbox)
            .subject("HDFC statement")
            .from("HDFC Bank <alerts@hdfcbank.example>")
            .to("user@example.com")
            .date("Wed, 5 Aug 2026 10:00:00 +0000")
            .body_text("Statement body with plenty of characters to summarize."),
    );
    // Force the worst case: planning, forced summary, main answer, repair.
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", "not json")
        .with_mapping("factual summary", "also not json")
        .with_mapping("Answer the question using only", "still not json")
        .with_mapping(
            "Summarize this message for the user",
            r#"{"summary": "Statement summary."}"#,
        );
    let generation_probe = generation.clone();

    let (pipeline, _) = pipeline(mailbox, generation);
    let outcome = pipeline
        .ask(&Question::new("summarize the hdfc email", "u1"))
        .await
        .unwrap();

    assert!(generation_probe.call_count() <= 4);
    assert_eq!(outcome.answer, "Statement summary.");
}

#[tokio::test]
async fn full_fetch_cap_holds_across_the_request() {
    let mut mailbox = FixtureMailbox::new();
    for i in 0..12 {
        mailbox = mailbox.with_message(
            FixtureMessage::new(format!("m{}", i), MailFolder::Inbox)
                .subject(format!("Update {}", i))
                .from("updates@acme.example")
                .to("user@example.com")
                .date("Wed, 5 Aug 2026 10:00:00 +0000")
                .body_text("A body comfortably longer than twenty characters."),
        );
    }
    let provider = Arc::new(mailbox);
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["update"]}"#)
        .with_mapping("Answer the question using only", r#"{"answer": "ok"}"#);
    let store = Arc::new(InMemoryStore::new());

    let provider_probe: Arc<FixtureMailbox> = provider.clone();
    let as_provider: Arc<dyn MailProvider> = provider;
    let pipeline = AskPipeline::new(as_provider, Arc::new(generation), store);

    pipeline
        .ask(&Question::new("any updates?", "u1"))
        .await
        .unwrap();

    assert!(provider_probe.full_fetch_count() <= 5);
}
