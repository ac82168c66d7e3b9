//! Core traits for mailsage abstractions.
//!
//! These traits define the external-collaborator seams (mailbox provider,
//! generation service, OCR, memory store), enabling pluggable backends and
//! testability. Wire-level implementations (Gmail/Graph REST, real session
//! handling) live outside this workspace.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FetchFormat, MailFolder, MemoryNote, ProviderMessage};

// =============================================================================
// MAILBOX PROVIDER
// =============================================================================

/// Read access to a user's mailbox.
///
/// Implementations must surface per-call failures as `Err` without any
/// retry/abort policy of their own; the pipeline treats every per-unit
/// provider error as recoverable.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// List up to `max_results` message ids matching `query`, scoped to
    /// `folder` when given (`None` searches all mail).
    async fn list_message_ids(
        &self,
        query: &str,
        folder: Option<MailFolder>,
        max_results: usize,
    ) -> Result<Vec<String>>;

    /// Fetch a single message. Metadata fetches carry only the
    /// From/To/Subject/Date headers.
    async fn get_message(&self, id: &str, format: FetchFormat) -> Result<ProviderMessage>;

    /// Fetch an attachment body as base64.
    async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<String>;
}

// =============================================================================
// GENERATION SERVICE
// =============================================================================

/// Backend for text generation (LLM).
///
/// Callers must treat the returned text as untrusted and validate it against
/// a strict JSON contract before use.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run one completion with a system prompt and a user prompt.
    ///
    /// A timeout is an `Err` ("service unavailable"), never an empty result.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// OCR
// =============================================================================

/// Backend for recognizing text in image parts of a message.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Recognize text in an image. Failures are surfaced as `Err`; the
    /// retrieval engine swallows them.
    async fn recognize_text(&self, image_data: &[u8], mime_type: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Store for persisted user memory notes. Append-only; each write is an
/// independent append keyed per user, so concurrent writers need no locking
/// beyond what the store provides.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Fetch up to `limit` notes for a user, most recently created first.
    async fn find_notes(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryNote>>;

    /// Append a note.
    async fn create_note(&self, note: MemoryNote) -> Result<()>;
}

/// In-memory `MemoryStore` for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryStore {
    notes: std::sync::Mutex<Vec<MemoryNote>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total notes held, across all users.
    pub fn len(&self) -> usize {
        self.notes.lock().expect("memory store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn find_notes(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryNote>> {
        let notes = self.notes.lock().expect("memory store lock");
        let mut matching: Vec<MemoryNote> = notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn create_note(&self, note: MemoryNote) -> Result<()> {
        self.notes.lock().expect("memory store lock").push(note);
        Ok(())
    }
}
