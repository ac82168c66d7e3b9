//! Domain model for the mailsage ask pipeline.
//!
//! Everything here except [`MemoryNote`] is request-scoped: created while a
//! single question is being answered and discarded once the response is
//! produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::is_valid_email;

// =============================================================================
// QUESTION
// =============================================================================

/// A raw mailbox question plus the requesting user identity. Immutable input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub user_id: String,
}

impl Question {
    pub fn new(text: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
        }
    }
}

// =============================================================================
// FOLDERS & FETCH FORMATS
// =============================================================================

/// A mailbox partition queried independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailFolder {
    Inbox,
    Sent,
}

impl MailFolder {
    /// Provider label string for this folder.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inbox => "INBOX",
            Self::Sent => "SENT",
        }
    }

    /// The fixed folder order the retrieval engine walks.
    pub fn retrieval_order() -> [MailFolder; 2] {
        [Self::Inbox, Self::Sent]
    }
}

impl std::fmt::Display for MailFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Full fetches return headers and body content; metadata fetches return
/// only the From/To/Subject/Date headers (cheaper).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchFormat {
    Full,
    Metadata,
}

// =============================================================================
// PROVIDER PAYLOAD
// =============================================================================

/// A single message header as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One node of a provider message part tree.
///
/// Text parts (`text/plain`, `text/html`) carry decoded UTF-8 in `data`;
/// binary parts carry base64. Attachment parts may carry an `attachment_id`
/// instead of inline data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePart {
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// First header value with the given name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// A message as returned by the provider, before parsing into a
/// [`CandidateMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub id: String,
    pub thread_id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<MessagePart>,
}

// =============================================================================
// CANDIDATE & COMPACT MESSAGES
// =============================================================================

/// A retrieved mailbox message. Identity (and dedup) is `id`;
/// `match_score` is set only by the participant matcher/enrichers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMessage {
    pub id: String,
    pub thread_id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub snippet: String,
    pub body_text: String,
    pub body_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<i32>,
}

/// Projection of a [`CandidateMessage`] for generation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactMessage {
    pub id: String,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub preview: String,
}

// =============================================================================
// ACTIONS & ANSWERS
// =============================================================================

/// A fully-specified proposed send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAction {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// A fully-specified proposed scheduled send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAction {
    pub when: String,
    pub timezone: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// The proposed action attached to an answer.
///
/// Modeled as a tagged variant rather than a nullable field bag so that
/// states like "send with no recipient" are unrepresentable: a `Send` value
/// always carries a recipient that passed the basic email check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AskAction {
    #[default]
    None,
    Send(SendAction),
    Schedule(ScheduleAction),
}

impl AskAction {
    /// Wire-level action tag (`"send"`, `"schedule"`, or absent).
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Send(_) => Some("send"),
            Self::Schedule(_) => Some("schedule"),
        }
    }

    pub fn send(&self) -> Option<&SendAction> {
        match self {
            Self::Send(s) => Some(s),
            _ => None,
        }
    }

    pub fn schedule(&self) -> Option<&ScheduleAction> {
        match self {
            Self::Schedule(s) => Some(s),
            _ => None,
        }
    }

    /// A `Send`/`Schedule` action must carry a plausible recipient.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::None => true,
            Self::Send(s) => is_valid_email(&s.to_email),
            Self::Schedule(s) => is_valid_email(&s.to_email) && !s.when.is_empty(),
        }
    }
}

/// The complete result of one ask request.
#[derive(Debug, Clone, Default)]
pub struct AskOutcome {
    pub answer: String,
    pub citations: Vec<String>,
    pub action: AskAction,
    pub messages: Vec<CandidateMessage>,
    pub queries: Vec<String>,
    pub forced_summary: Option<String>,
}

// =============================================================================
// MEMORY NOTES
// =============================================================================

/// A persisted "remember X: Y" note. Append-only, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl MemoryNote {
    pub fn note(user_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            kind: "note".to_string(),
            key: key.into(),
            value: value.into(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// UNTRUSTED GENERATION CONTRACTS
// =============================================================================
//
// Shapes the generation service is asked to return. All of them are parsed
// through the strict-contract parser and validated before use; defaults
// absorb missing fields so a partially-conforming object still parses.

/// `{ "queries": [...] }` from the query-planning call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannedQueries {
    pub queries: Vec<String>,
}

/// `{ "summary": "..." }` from forced-summary and repair calls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SummaryReply {
    pub summary: String,
}

/// Draft send fields as returned by the model (possibly incomplete).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftSend {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Draft schedule fields as returned by the model (possibly incomplete).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftSchedule {
    pub when: String,
    pub timezone: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// The main answer contract. `action` is a raw string here on purpose: the
/// model output is untrusted and only the action-inference pass promotes it
/// into an [`AskAction`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftAnswer {
    pub answer: String,
    pub citations: Vec<String>,
    pub action: Option<String>,
    pub send: Option<DraftSend>,
    pub schedule: Option<DraftSchedule>,
}

// =============================================================================
// WIRE DTOS
// =============================================================================

/// `POST /ask` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// `POST /ask` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send: Option<SendAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleAction>,
    pub messages: Vec<CandidateMessage>,
    pub queries: Vec<String>,
}

impl From<AskOutcome> for AskResponse {
    fn from(outcome: AskOutcome) -> Self {
        let action = outcome.action.kind().map(str::to_string);
        let send = outcome.action.send().cloned();
        let schedule = outcome.action.schedule().cloned();
        Self {
            answer: outcome.answer,
            citations: outcome.citations,
            action,
            send,
            schedule,
            messages: outcome.messages,
            queries: outcome.queries,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
