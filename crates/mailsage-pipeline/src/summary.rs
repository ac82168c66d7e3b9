//! Forced-summary subflow.
//!
//! An independent, higher-precision path for summarize/TL;DR questions: a
//! focused query over the question's salient tokens, a small full-format
//! fetch from the inbox, recency ranking, and a dedicated summary call.
//! Failure anywhere leaves the forced summary empty; the main answer path
//! proceeds unaffected.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use mailsage_core::text::truncate_chars;
use mailsage_core::{
    defaults, FetchFormat, GenerationBackend, MailFolder, MailProvider, SummaryReply,
};
use mailsage_inference::{extract_contract, Extracted};
use mailsage_mail::html_to_text;

use crate::compact::rank_by_recency;
use crate::config::PipelineConfig;
use crate::retrieval::candidate_from;

/// A summary produced by the forced path, with the subject of the message
/// it summarizes (used for the default send subject).
#[derive(Debug, Clone)]
pub struct ForcedSummary {
    pub subject: String,
    pub summary: String,
}

/// Question tokens with no value in a summary-focused query.
const SUMMARY_STOPWORDS: &[&str] = &[
    "summarize", "summarise", "summary", "tldr", "tl", "dr", "brief", "briefly", "short",
    "shortly", "recap",
];

fn summary_intent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(summari[sz]e|summary|tl;?dr|brief(ly)?|recap)\b").expect("valid regex")
    })
}

/// Whether the question asks for a summary.
pub fn has_summary_intent(text: &str) -> bool {
    summary_intent_re().is_match(&text.to_lowercase())
}

/// Focused query over the question's salient tokens:
/// `(from:<t> OR subject:<t>)` ORed together.
fn focused_query(question: &str, token_limit: usize) -> String {
    let tokens: Vec<String> = mailsage_core::text::extract_keywords(question)
        .into_iter()
        .filter(|t| !SUMMARY_STOPWORDS.contains(&t.as_str()))
        .take(token_limit)
        .collect();

    if tokens.is_empty() {
        return defaults::CATCH_ALL_QUERY.to_string();
    }
    tokens
        .iter()
        .map(|t| format!("(from:{t} OR subject:{t})"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

const SUMMARY_SYSTEM: &str = "You summarize a single email message factually.";

fn summary_prompt(subject: &str, from: &str, body: &str) -> String {
    format!(
        "Write a 4-7 sentence factual summary of this message. Respond with \
         only a JSON object of the form {{\"summary\": \"...\"}}.\n\n\
         Subject: {}\nFrom: {}\n\n{}",
        subject, from, body
    )
}

/// Run the forced-summary subflow. Every failure returns `None`.
pub async fn forced_summary(
    provider: &Arc<dyn MailProvider>,
    generation: &dyn GenerationBackend,
    config: &PipelineConfig,
    question: &str,
) -> Option<ForcedSummary> {
    let query = focused_query(question, config.summary_token_limit);

    let ids = match provider
        .list_message_ids(&query, Some(MailFolder::Inbox), config.summary_fetch_limit)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!(query = %query, error = %e, "Forced summary listing failed");
            return None;
        }
    };

    let mut candidates = Vec::new();
    for id in ids.iter().take(config.summary_fetch_limit) {
        match provider.get_message(id, FetchFormat::Full).await {
            Ok(message) => candidates.push(candidate_from(&message)),
            Err(e) => {
                debug!(message_id = %id, error = %e, "Forced summary fetch failed; skipping");
            }
        }
    }

    let ranked = rank_by_recency(&candidates);
    let top = ranked.first()?;

    let body = if !top.body_text.is_empty() {
        top.body_text.clone()
    } else if !top.body_html.is_empty() {
        html_to_text(&top.body_html)
    } else {
        top.snippet.clone()
    };
    let body = truncate_chars(body.trim(), config.summary_body_chars);
    if body.is_empty() {
        return None;
    }

    let raw = match generation
        .complete(
            SUMMARY_SYSTEM,
            &summary_prompt(&top.subject, &top.from, &body),
            defaults::ANSWER_TEMPERATURE,
            defaults::SUMMARY_MAX_TOKENS,
        )
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Forced summary generation failed");
            return None;
        }
    };

    match extract_contract::<SummaryReply>(&raw) {
        Extracted::Valid(reply) if !reply.summary.trim().is_empty() => Some(ForcedSummary {
            subject: top.subject.clone(),
            summary: reply.summary.trim().to_string(),
        }),
        Extracted::Valid(_) => None,
        Extracted::Malformed { reason } => {
            warn!(reason = %reason, "Forced summary output malformed");
            None
        }
    }
}
