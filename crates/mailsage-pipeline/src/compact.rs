//! Context compaction.
//!
//! Sorts the aggregated result set by recency and shrinks it to fit the
//! generation-time size budget, guaranteeing a bounded prompt regardless of
//! mailbox size.

use std::cmp::Reverse;

use tracing::debug;

use mailsage_core::text::truncate_chars;
use mailsage_core::{parse_message_date, CandidateMessage, CompactMessage};
use mailsage_mail::html_to_text;

use crate::config::PipelineConfig;

/// Milliseconds since epoch for ranking; unparseable dates sort as epoch 0.
fn recency_key(message: &CandidateMessage) -> i64 {
    parse_message_date(&message.date)
        .map(|d| d.timestamp_millis())
        .unwrap_or(0)
}

/// Sort candidates by parsed date, most recent first.
pub fn rank_by_recency(messages: &[CandidateMessage]) -> Vec<CandidateMessage> {
    let mut ranked: Vec<CandidateMessage> = messages.to_vec();
    ranked.sort_by_key(|m| Reverse(recency_key(m)));
    ranked
}

/// Preview text for a message: body text, HTML-to-text conversion, or
/// snippet, in that preference order.
fn preview_of(message: &CandidateMessage, max_chars: usize) -> String {
    let source = if !message.body_text.is_empty() {
        message.body_text.clone()
    } else if !message.body_html.is_empty() {
        html_to_text(&message.body_html)
    } else {
        message.snippet.clone()
    };
    truncate_chars(source.trim(), max_chars)
}

/// Compact the result set for generation input.
///
/// Takes the `compact_limit` most recent messages; if the serialized list
/// exceeds the character budget, shrinks to `compact_shrink_first`, then to
/// `compact_shrink_second`.
pub fn compact_messages(
    messages: &[CandidateMessage],
    config: &PipelineConfig,
) -> Vec<CompactMessage> {
    let ranked = rank_by_recency(messages);
    let mut compacts: Vec<CompactMessage> = ranked
        .iter()
        .take(config.compact_limit)
        .map(|m| CompactMessage {
            id: m.id.clone(),
            subject: m.subject.clone(),
            from: m.from.clone(),
            to: m.to.clone(),
            date: m.date.clone(),
            preview: preview_of(m, config.preview_chars),
        })
        .collect();

    for shrink in [config.compact_shrink_first, config.compact_shrink_second] {
        let serialized_len = serde_json::to_string(&compacts)
            .map(|s| s.len())
            .unwrap_or(0);
        if serialized_len <= config.compact_budget_chars {
            break;
        }
        debug!(
            serialized_len,
            shrink, "Compact context over budget; shrinking"
        );
        compacts.truncate(shrink);
    }

    compacts
}
