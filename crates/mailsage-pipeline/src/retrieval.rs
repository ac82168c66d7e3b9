//! Retrieval engine.
//!
//! Executes the planned queries against the mailbox provider, one unit per
//! query and folder, on a bounded worker pool. Backpressure is entirely static caps: at most
//! `list_page_limit` ids per unit, `full_fetch_limit` full-format fetches
//! per request (shared across workers), and `aggregate_limit` candidate
//! messages overall. A provider error skips that query+folder unit and the
//! engine continues; result ordering does not matter because ranking
//! happens at compaction.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use mailsage_core::{
    CandidateMessage, FetchFormat, MailFolder, MailProvider, MessagePart, OcrBackend,
    ProviderMessage,
};
use mailsage_mail::{collect_image_parts, extract_bodies};

use crate::config::PipelineConfig;

/// Aggregated retrieval output: deduplicated candidates plus every From/To
/// header value seen, in first-seen order.
#[derive(Debug, Default)]
pub struct RetrievalOutcome {
    pub messages: Vec<CandidateMessage>,
    pub participants: Vec<String>,
}

/// Parse a provider message into a [`CandidateMessage`].
pub fn candidate_from(message: &ProviderMessage) -> CandidateMessage {
    let payload = message.payload.as_ref();
    let header = |name: &str| {
        payload
            .and_then(|p| p.header(name))
            .unwrap_or_default()
            .to_string()
    };

    let body = payload.map(extract_bodies).unwrap_or_default();
    let mut date = header("Date");
    if date.is_empty() {
        date = message
            .internal_date
            .map(|d| d.to_rfc2822())
            .unwrap_or_default();
    }

    CandidateMessage {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        subject: header("Subject"),
        from: header("From"),
        to: header("To"),
        date,
        snippet: message.snippet.clone(),
        body_text: body.text.unwrap_or_default(),
        body_html: body.html.unwrap_or_default(),
        match_score: None,
    }
}

/// Resolve an image part to raw bytes: inline base64 data, or an attachment
/// fetched through the provider.
async fn image_bytes(
    provider: &Arc<dyn MailProvider>,
    message_id: &str,
    part: &MessagePart,
) -> Option<Vec<u8>> {
    let encoded = if let Some(data) = &part.data {
        data.clone()
    } else if let Some(attachment_id) = &part.attachment_id {
        match provider.get_attachment(message_id, attachment_id).await {
            Ok(data) => data,
            Err(e) => {
                debug!(message_id = message_id, error = %e, "Attachment fetch failed");
                return None;
            }
        }
    } else {
        return None;
    };

    match base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes()) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            debug!(message_id = message_id, error = %e, "Image part was not valid base64");
            None
        }
    }
}

/// OCR fallback for full-format messages with (near-)empty bodies: run the
/// OCR backend over up to `ocr_max_image_parts` image parts and append the
/// recognized text, capped at `ocr_max_chars` accumulated characters. Every
/// failure is swallowed.
async fn apply_ocr_fallback(
    provider: &Arc<dyn MailProvider>,
    ocr: &Arc<dyn OcrBackend>,
    config: &PipelineConfig,
    message: &ProviderMessage,
    candidate: &mut CandidateMessage,
) {
    let Some(payload) = message.payload.as_ref() else {
        return;
    };

    let mut recognized = String::new();
    for part in collect_image_parts(payload, config.ocr_max_image_parts) {
        if recognized.len() >= config.ocr_max_chars {
            break;
        }
        let Some(bytes) = image_bytes(provider, &message.id, part).await else {
            continue;
        };
        match ocr.recognize_text(&bytes, &part.mime_type).await {
            Ok(text) => {
                let remaining = config.ocr_max_chars - recognized.len();
                let text = mailsage_core::text::truncate_chars(text.trim(), remaining);
                if !text.is_empty() {
                    if !recognized.is_empty() {
                        recognized.push(' ');
                    }
                    recognized.push_str(&text);
                }
            }
            Err(e) => {
                debug!(message_id = %message.id, error = %e, "OCR failed for image part");
            }
        }
    }

    if !recognized.is_empty() {
        debug!(
            message_id = %message.id,
            ocr_chars = recognized.len(),
            "Appending OCR text to image-only body"
        );
        if !candidate.body_text.is_empty() {
            candidate.body_text.push(' ');
        }
        candidate.body_text.push_str(&recognized);
    }
}

/// Claim one unit of the request-wide full-fetch budget, falling back to
/// metadata once it is spent.
fn claim_format(budget: &AtomicUsize, limit: usize) -> FetchFormat {
    loop {
        let current = budget.load(Ordering::SeqCst);
        if current >= limit {
            return FetchFormat::Metadata;
        }
        if budget
            .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return FetchFormat::Full;
        }
    }
}

/// One query+folder unit of work.
#[allow(clippy::too_many_arguments)]
async fn fetch_unit(
    provider: Arc<dyn MailProvider>,
    ocr: Option<Arc<dyn OcrBackend>>,
    config: PipelineConfig,
    query: String,
    folder: MailFolder,
    full_budget: Arc<AtomicUsize>,
    claimed: Arc<Mutex<HashSet<String>>>,
    aggregate_count: Arc<AtomicUsize>,
) -> (Vec<CandidateMessage>, Vec<String>) {
    let ids = match provider
        .list_message_ids(&query, Some(folder), config.list_page_limit)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!(query = %query, folder = %folder, error = %e, "Skipping query+folder unit");
            return (Vec::new(), Vec::new());
        }
    };

    let mut messages = Vec::new();
    let mut participants = Vec::new();

    for id in ids {
        if aggregate_count.load(Ordering::SeqCst) >= config.aggregate_limit {
            break;
        }
        {
            let mut set = claimed.lock().expect("claimed id set");
            if !set.insert(id.clone()) {
                continue;
            }
        }

        let format = claim_format(&full_budget, config.full_fetch_limit);
        let message = match provider.get_message(&id, format).await {
            Ok(message) => message,
            Err(e) => {
                debug!(message_id = %id, error = %e, "Message fetch failed; skipping");
                continue;
            }
        };

        let mut candidate = candidate_from(&message);
        if format == FetchFormat::Full
            && candidate.body_text.len() < config.min_body_chars_before_ocr
        {
            if let Some(ocr) = ocr.as_ref() {
                apply_ocr_fallback(&provider, ocr, &config, &message, &mut candidate).await;
            }
        }

        if !candidate.from.is_empty() {
            participants.push(candidate.from.clone());
        }
        if !candidate.to.is_empty() {
            participants.push(candidate.to.clone());
        }

        aggregate_count.fetch_add(1, Ordering::SeqCst);
        messages.push(candidate);
    }

    (messages, participants)
}

/// Run the planned queries against the provider.
pub async fn run_retrieval(
    provider: &Arc<dyn MailProvider>,
    ocr: Option<&Arc<dyn OcrBackend>>,
    config: &PipelineConfig,
    queries: &[String],
) -> RetrievalOutcome {
    let mut units = Vec::new();
    for query in queries {
        for folder in MailFolder::retrieval_order() {
            units.push((query.clone(), folder));
        }
    }

    let full_budget = Arc::new(AtomicUsize::new(0));
    let claimed: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let aggregate_count = Arc::new(AtomicUsize::new(0));

    let tasks = units.into_iter().map(|(query, folder)| {
        let provider = Arc::clone(provider);
        let ocr = ocr.map(Arc::clone);
        let config = config.clone();
        let full_budget = Arc::clone(&full_budget);
        let claimed = Arc::clone(&claimed);
        let aggregate_count = Arc::clone(&aggregate_count);
        fetch_unit(
            provider,
            ocr,
            config,
            query,
            folder,
            full_budget,
            claimed,
            aggregate_count,
        )
    });

    let unit_results: Vec<(Vec<CandidateMessage>, Vec<String>)> = stream::iter(tasks)
        .buffer_unordered(config.retrieval_concurrency.max(1))
        .collect()
        .await;

    let mut outcome = RetrievalOutcome::default();
    let mut seen_ids = HashSet::new();
    let mut seen_participants = HashSet::new();
    for (messages, participants) in unit_results {
        for message in messages {
            if outcome.messages.len() >= config.aggregate_limit {
                break;
            }
            if seen_ids.insert(message.id.clone()) {
                outcome.messages.push(message);
            }
        }
        for participant in participants {
            if seen_participants.insert(participant.clone()) {
                outcome.participants.push(participant);
            }
        }
    }

    debug!(
        result_count = outcome.messages.len(),
        full_fetches = full_budget.load(Ordering::SeqCst),
        "Retrieval complete"
    );
    outcome
}
