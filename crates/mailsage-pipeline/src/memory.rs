//! Memory capture.
//!
//! Extracts "remember X: Y" statements from the raw question and persists
//! them as notes. Runs independently of the rest of the pipeline, keyed off
//! the raw question; persistence failures are swallowed.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use mailsage_core::text::truncate_chars;
use mailsage_core::{defaults, MemoryNote, MemoryStore, Question};

fn remember_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)remember (?:that )?(.+?):\s*(.+)$").expect("valid regex"))
}

/// Parse a "remember X: Y" statement into `(key, value)`.
///
/// The key is lowercased and clamped to 120 chars; the value is clamped to
/// 2000 chars.
pub fn parse_remember(text: &str) -> Option<(String, String)> {
    let caps = remember_re().captures(text)?;
    let key = truncate_chars(
        caps[1].trim().to_lowercase().as_str(),
        defaults::MEMORY_KEY_CHARS,
    );
    let value = truncate_chars(caps[2].trim(), defaults::MEMORY_VALUE_CHARS);
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Capture a memory note from the question, fire-and-forget.
pub async fn capture_memory(store: &dyn MemoryStore, question: &Question) {
    let Some((key, value)) = parse_remember(&question.text) else {
        return;
    };

    debug!(user_id = %question.user_id, key = %key, "Capturing memory note");
    let note = MemoryNote::note(question.user_id.clone(), key, value);
    if let Err(e) = store.create_note(note).await {
        warn!(error = %e, "Memory note persistence failed; continuing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailsage_core::InMemoryStore;

    #[test]
    fn test_parse_remember_basic() {
        let (key, value) = parse_remember("remember my landlord: Ravi, flat 4B").unwrap();
        assert_eq!(key, "my landlord");
        assert_eq!(value, "Ravi, flat 4B");
    }

    #[test]
    fn test_parse_remember_with_that() {
        let (key, value) = parse_remember("Remember that rent day: 3rd of the month").unwrap();
        assert_eq!(key, "rent day");
        assert_eq!(value, "3rd of the month");
    }

    #[test]
    fn test_parse_remember_case_insensitive_and_lowercased_key() {
        let (key, _) = parse_remember("REMEMBER Team Standup: daily at 10").unwrap();
        assert_eq!(key, "team standup");
    }

    #[test]
    fn test_parse_remember_lazy_key_stops_at_first_colon() {
        let (key, value) = parse_remember("remember door code: 12:34").unwrap();
        assert_eq!(key, "door code");
        assert_eq!(value, "12:34");
    }

    #[test]
    fn test_parse_remember_clamps_lengths() {
        let long_key = "k".repeat(300);
        let long_value = "v".repeat(3000);
        let (key, value) =
            parse_remember(&format!("remember {}: {}", long_key, long_value)).unwrap();
        assert_eq!(key.chars().count(), defaults::MEMORY_KEY_CHARS);
        assert_eq!(value.chars().count(), defaults::MEMORY_VALUE_CHARS);
    }

    #[test]
    fn test_parse_remember_no_match() {
        assert!(parse_remember("show me yesterday's emails").is_none());
        assert!(parse_remember("remember nothing in particular").is_none());
    }

    #[tokio::test]
    async fn test_capture_persists_note() {
        let store = InMemoryStore::new();
        let question = Question::new("remember my landlord: Ravi", "u1");

        capture_memory(&store, &question).await;

        let notes = store.find_notes("u1", 10).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].key, "my landlord");
        assert_eq!(notes[0].value, "Ravi");
        assert_eq!(notes[0].kind, "note");
    }

    #[tokio::test]
    async fn test_capture_noop_without_statement() {
        let store = InMemoryStore::new();
        capture_memory(&store, &Question::new("any invoices?", "u1")).await;
        assert!(store.is_empty());
    }
}
