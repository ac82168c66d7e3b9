//! Answer synthesis.
//!
//! One generation call carrying the participants, the user's memory notes,
//! the target tokens, the raw question, and the compacted message list.
//! Malformed or sentinel output is repaired (forced summary, then a
//! narrower summarization of the top result), and a deterministic
//! descriptive answer covers the no-results case. Only a generation-service
//! failure on the primary call is a request-level error.

use tracing::{debug, warn};

use mailsage_core::text::truncate_chars;
use mailsage_core::{
    defaults, CandidateMessage, CompactMessage, DateRange, DraftAnswer, GenerationBackend,
    MemoryNote, Result, SummaryReply,
};
use mailsage_inference::{extract_contract, Extracted};

use crate::compact::rank_by_recency;
use crate::config::PipelineConfig;
use crate::summary::ForcedSummary;

/// Result of the synthesis stage: the answer text plus the raw draft for
/// the action-inference pass.
#[derive(Debug, Default)]
pub struct SynthesisOutcome {
    pub answer: String,
    pub citations: Vec<String>,
    pub draft: Option<DraftAnswer>,
}

const SYNTH_SYSTEM: &str = "You are a mailbox assistant answering questions about the user's email.";

fn synth_prompt(
    question: &str,
    target_tokens: &[String],
    participants: &[String],
    notes: &[MemoryNote],
    compact: &[CompactMessage],
) -> String {
    let notes_block = if notes.is_empty() {
        "(none)".to_string()
    } else {
        notes
            .iter()
            .map(|n| format!("- {}: {}", n.key, n.value))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let participants_block = if participants.is_empty() {
        "(none)".to_string()
    } else {
        participants.join("; ")
    };
    let target_block = if target_tokens.is_empty() {
        "(none)".to_string()
    } else {
        target_tokens.join(" ")
    };
    let messages_json = serde_json::to_string(compact).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Answer the question using only the messages below. Respond with only \
         a JSON object of the form {{\"answer\": \"...\", \"citations\": \
         [\"<message id>\"], \"action\": \"send\"|\"schedule\"|null, \"send\": \
         {{\"toEmail\": \"...\", \"subject\": \"...\", \"body\": \"...\"}}, \
         \"schedule\": {{\"when\": \"...\", \"timezone\": \"...\", \"toEmail\": \
         \"...\", \"subject\": \"...\", \"body\": \"...\"}}}}. Omit send and \
         schedule unless the user asked to send something. If you cannot \
         answer from the messages, set answer to \"{}\".\n\n\
         Participants: {}\nMemory notes:\n{}\nTarget: {}\n\nQuestion: {}\n\n\
         Messages: {}",
        defaults::NO_ANSWER_SENTINEL,
        participants_block,
        notes_block,
        target_block,
        question,
        messages_json
    )
}

const REPAIR_SYSTEM: &str = "You summarize a single email message factually.";

fn repair_prompt(top: &CandidateMessage, config: &PipelineConfig) -> String {
    let body = if !top.body_text.is_empty() {
        top.body_text.clone()
    } else {
        top.snippet.clone()
    };
    format!(
        "Summarize this message for the user in 2-4 sentences. Respond with \
         only a JSON object of the form {{\"summary\": \"...\"}}.\n\n\
         Subject: {}\nFrom: {}\nDate: {}\n\n{}",
        top.subject,
        top.from,
        top.date,
        truncate_chars(&body, config.summary_body_chars)
    )
}

/// Deterministic heuristic description of the top result, used when even
/// the repair call fails.
fn heuristic_summary(top: &CandidateMessage) -> String {
    let preview = if !top.body_text.is_empty() {
        top.body_text.clone()
    } else {
        top.snippet.clone()
    };
    format!(
        "Latest message from {}: \"{}\". {}",
        top.from,
        top.subject,
        truncate_chars(preview.trim(), 200)
    )
}

/// Deterministic no-results answer, including the date-window description
/// when one was parsed.
pub fn no_results_answer(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!(
            "I could not find messages matching your request {}. Try a different \
             keyword or a wider date range.",
            range.description
        ),
        None => "I could not find messages matching your request. Try a different \
                 keyword or a wider date range."
            .to_string(),
    }
}

/// Narrower summarization of the top-ranked result (the repair path).
async fn repair_answer(
    generation: &dyn GenerationBackend,
    config: &PipelineConfig,
    top: &CandidateMessage,
) -> String {
    let raw = match generation
        .complete(
            REPAIR_SYSTEM,
            &repair_prompt(top, config),
            defaults::ANSWER_TEMPERATURE,
            defaults::SUMMARY_MAX_TOKENS,
        )
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Repair summarization failed; using heuristic summary");
            return heuristic_summary(top);
        }
    };

    match extract_contract::<SummaryReply>(&raw) {
        Extracted::Valid(reply) if !reply.summary.trim().is_empty() => {
            reply.summary.trim().to_string()
        }
        _ => {
            warn!("Repair summarization output malformed; using heuristic summary");
            heuristic_summary(top)
        }
    }
}

/// Run the primary answer call, with repair and deterministic fallbacks.
#[allow(clippy::too_many_arguments)]
pub async fn synthesize_answer(
    generation: &dyn GenerationBackend,
    config: &PipelineConfig,
    question: &str,
    range: Option<&DateRange>,
    target_tokens: &[String],
    participants: &[String],
    notes: &[MemoryNote],
    compact: &[CompactMessage],
    messages: &[CandidateMessage],
    forced: Option<&ForcedSummary>,
) -> Result<SynthesisOutcome> {
    let notes = &notes[..notes.len().min(config.memory_note_limit)];
    let prompt = synth_prompt(question, target_tokens, participants, notes, compact);

    // Generation-service unavailability on the primary call is the one
    // failure that surfaces to the caller.
    let raw = generation
        .complete(
            SYNTH_SYSTEM,
            &prompt,
            defaults::ANSWER_TEMPERATURE,
            defaults::ANSWER_MAX_TOKENS,
        )
        .await?;

    let draft = match extract_contract::<DraftAnswer>(&raw) {
        Extracted::Valid(draft) => Some(draft),
        Extracted::Malformed { reason } => {
            warn!(reason = %reason, "Answer output malformed; entering repair path");
            None
        }
    };

    let answer_usable = draft
        .as_ref()
        .map(|d| {
            let answer = d.answer.trim();
            !answer.is_empty() && answer != defaults::NO_ANSWER_SENTINEL
        })
        .unwrap_or(false);

    let citations = draft
        .as_ref()
        .map(|d| d.citations.clone())
        .unwrap_or_default();

    if answer_usable {
        let answer = draft.as_ref().map(|d| d.answer.trim().to_string());
        return Ok(SynthesisOutcome {
            answer: answer.unwrap_or_default(),
            citations,
            draft,
        });
    }

    // Repair chain: forced summary, narrower top-result summary, then the
    // deterministic no-results answer.
    let answer = if let Some(forced) = forced {
        debug!("Using forced summary as answer");
        forced.summary.clone()
    } else {
        let ranked = rank_by_recency(messages);
        match ranked.first() {
            Some(top) => repair_answer(generation, config, top).await,
            None => no_results_answer(range),
        }
    };

    Ok(SynthesisOutcome {
        answer,
        citations,
        draft,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mailsage_core::parse_date_range;
    use mailsage_inference::MockGenerationBackend;

    fn top_message() -> CandidateMessage {
        CandidateMessage {
            id: "m1".to_string(),
            thread_id: "t1".to_string(),
            subject: "Invoice #102".to_string(),
            from: "Billing <billing@acme.example>".to_string(),
            to: "user@example.com".to_string(),
            date: "Wed, 5 Aug 2026 10:00:00 +0000".to_string(),
            snippet: "Your invoice is attached".to_string(),
            body_text: "Please find invoice #102 attached.".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_valid_answer_passes_through() {
        let generation = MockGenerationBackend::new()
            .with_default(r#"{"answer": "One invoice arrived yesterday.", "citations": ["m1"]}"#);
        let outcome = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "q",
            None,
            &[],
            &[],
            &[],
            &[],
            &[top_message()],
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.answer, "One invoice arrived yesterday.");
        assert_eq!(outcome.citations, vec!["m1"]);
        assert!(outcome.draft.is_some());
        assert_eq!(generation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_with_results_invokes_repair() {
        let generation = MockGenerationBackend::new()
            .with_response("garbage, not json")
            .with_response(r#"{"summary": "Invoice #102 arrived from Acme billing."}"#);

        let outcome = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "q",
            None,
            &[],
            &[],
            &[],
            &[],
            &[top_message()],
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.answer, "Invoice #102 arrived from Acme billing.");
        assert_eq!(generation.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repair_failure_degrades_to_heuristic() {
        let generation = MockGenerationBackend::new()
            .with_response("garbage")
            .with_failure("down");

        let outcome = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "q",
            None,
            &[],
            &[],
            &[],
            &[],
            &[top_message()],
            None,
        )
        .await
        .unwrap();

        assert!(outcome.answer.contains("Invoice #102"));
        assert!(outcome.answer.contains("billing@acme.example"));
    }

    #[tokio::test]
    async fn test_sentinel_answer_prefers_forced_summary() {
        let generation =
            MockGenerationBackend::new().with_default(r#"{"answer": "No answer"}"#);
        let forced = ForcedSummary {
            subject: "HDFC statement".to_string(),
            summary: "July statement; closing balance 1,20,000.".to_string(),
        };

        let outcome = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "q",
            None,
            &[],
            &[],
            &[],
            &[],
            &[top_message()],
            Some(&forced),
        )
        .await
        .unwrap();

        assert_eq!(outcome.answer, "July statement; closing balance 1,20,000.");
        // No repair call was needed.
        assert_eq!(generation.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_results_deterministic_fallback_includes_window() {
        let generation =
            MockGenerationBackend::new().with_default(r#"{"answer": "No answer"}"#);
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        let range = parse_date_range("find emails from last month", now);

        let outcome = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "find emails from last month",
            range.as_ref(),
            &[],
            &[],
            &[],
            &[],
            &[],
            None,
        )
        .await
        .unwrap();

        assert!(outcome.answer.contains("within last month"));
        assert!(outcome.answer.starts_with("I could not find messages"));
    }

    #[tokio::test]
    async fn test_primary_generation_failure_propagates() {
        let generation = MockGenerationBackend::new().fail_always();
        let result = synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "q",
            None,
            &[],
            &[],
            &[],
            &[],
            &[],
            None,
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prompt_carries_notes_and_participants() {
        let generation =
            MockGenerationBackend::new().with_default(r#"{"answer": "ok"}"#);
        let notes = vec![MemoryNote::note("u1", "meeting day", "thursdays")];
        let participants = vec!["Billing <billing@acme.example>".to_string()];

        synthesize_answer(
            &generation,
            &PipelineConfig::default(),
            "what changed?",
            None,
            &["priya".to_string()],
            &participants,
            &notes,
            &[],
            &[],
            None,
        )
        .await
        .unwrap();

        let calls = generation.calls();
        assert!(calls[0].prompt.contains("meeting day: thursdays"));
        assert!(calls[0].prompt.contains("billing@acme.example"));
        assert!(calls[0].prompt.contains("Target: priya"));
        assert!(calls[0].prompt.contains("what changed?"));
    }
}
