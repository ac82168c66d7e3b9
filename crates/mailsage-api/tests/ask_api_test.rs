//! Routing and auth tests for the ask API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use mailsage_api::{app, AppState};
use mailsage_core::{AskResponse, InMemoryStore, MailFolder};
use mailsage_inference::MockGenerationBackend;
use mailsage_mail::{FixtureMailbox, FixtureMessage};
use mailsage_pipeline::AskPipeline;

fn test_state() -> AppState {
    let mailbox = FixtureMailbox::new().with_message(
        FixtureMessage::new("m1", MailFolder::Inbox)
            .subject("Invoice #102")
            .from("Billing <billing@acme.example>")
            .to("user@example.com")
            .date("Wed, 5 Aug 2026 10:00:00 +0000")
            .body_text("Please find invoice #102 attached."),
    );
    let generation = MockGenerationBackend::new()
        .with_mapping("provider search queries", r#"{"queries": ["invoice"]}"#)
        .with_mapping(
            "Answer the question using only",
            r#"{"answer": "One invoice arrived.", "citations": ["m1"]}"#,
        );
    let pipeline = AskPipeline::new(
        Arc::new(mailbox),
        Arc::new(generation),
        Arc::new(InMemoryStore::new()),
    );

    AppState {
        pipeline: Some(Arc::new(pipeline)),
        session_token: Some("secret-token".to_string()),
        user_id: "u1".to_string(),
    }
}

fn ask_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/ask")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ask_without_session_is_401() {
    let response = app(test_state())
        .oneshot(ask_request(None, r#"{"question": "any invoices?"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ask_with_wrong_token_is_401() {
    let response = app(test_state())
        .oneshot(ask_request(Some("wrong"), r#"{"question": "any invoices?"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ask_happy_path_returns_payload() {
    let response = app(test_state())
        .oneshot(ask_request(
            Some("secret-token"),
            r#"{"question": "any invoices?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let payload: AskResponse = serde_json::from_value(json).unwrap();
    assert_eq!(payload.answer, "One invoice arrived.");
    assert_eq!(payload.citations, vec!["m1"]);
    assert!(payload.action.is_none());
    assert!(payload.messages.iter().any(|m| m.id == "m1"));
    assert!(!payload.queries.is_empty());
}

#[tokio::test]
async fn ask_with_empty_question_is_400() {
    let response = app(test_state())
        .oneshot(ask_request(Some("secret-token"), r#"{"question": "  "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ask_without_generation_credential_is_500() {
    let state = AppState {
        pipeline: None,
        ..test_state()
    };
    let response = app(state)
        .oneshot(ask_request(
            Some("secret-token"),
            r#"{"question": "any invoices?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("credential not configured"));
}

#[tokio::test]
async fn ask_surfaces_primary_generation_failure_as_500() {
    let state = test_state();
    let failing = AskPipeline::new(
        Arc::new(FixtureMailbox::new()),
        Arc::new(MockGenerationBackend::new().fail_always()),
        Arc::new(InMemoryStore::new()),
    );
    let state = AppState {
        pipeline: Some(Arc::new(failing)),
        ..state
    };

    let response = app(state)
        .oneshot(ask_request(
            Some("secret-token"),
            r#"{"question": "any invoices?"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_needs_no_session() {
    let response = app(test_state())
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
