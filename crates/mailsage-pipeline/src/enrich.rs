//! Fallback enrichers.
//!
//! Two best-effort refinements of the primary retrieval output:
//!
//! - **Recent-window enrichment**: when too few results came back and the
//!   question names a target person, scan recent messages in both folders
//!   and merge the ones whose From/To scores past the participant gate.
//! - **Broadening fallback**: when a date-constrained search found nothing
//!   at all, retry once across all mail with only the date constraint.
//!
//! Both are silent on provider failure and idempotent under repetition
//! (merges are id-deduplicated).

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use mailsage_core::{CandidateMessage, DateRange, FetchFormat, MailFolder, MailProvider};

use crate::config::PipelineConfig;
use crate::participants::best_score;
use crate::retrieval::candidate_from;

/// Recent-window scan-and-score enrichment.
///
/// Triggers when fewer than `enrich_min_results` messages were retrieved
/// and at least one target-name token exists. Scans up to
/// `enrich_scan_limit` recent messages per folder (metadata only), merging
/// messages that score at least `enrich_score_threshold`, capped at
/// `enrich_merge_limit` newly added.
pub async fn enrich_recent_window(
    provider: &Arc<dyn MailProvider>,
    config: &PipelineConfig,
    target_tokens: &[String],
    messages: &mut Vec<CandidateMessage>,
) {
    if messages.len() >= config.enrich_min_results || target_tokens.is_empty() {
        return;
    }

    let mut seen: HashSet<String> = messages.iter().map(|m| m.id.clone()).collect();
    let mut added = 0usize;

    for folder in MailFolder::retrieval_order() {
        let ids = match provider
            .list_message_ids("", Some(folder), config.enrich_scan_limit)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                warn!(folder = %folder, error = %e, "Recent-window enrichment aborted");
                return;
            }
        };

        for id in ids {
            if seen.contains(&id) {
                continue;
            }
            let message = match provider.get_message(&id, FetchFormat::Metadata).await {
                Ok(message) => message,
                Err(e) => {
                    warn!(message_id = %id, error = %e, "Recent-window enrichment aborted");
                    return;
                }
            };

            let mut candidate = candidate_from(&message);
            let score = best_score(&candidate.from, &candidate.to, target_tokens);
            if score < config.enrich_score_threshold {
                continue;
            }

            candidate.match_score = Some(score);
            seen.insert(candidate.id.clone());
            messages.push(candidate);
            added += 1;
            if added >= config.enrich_merge_limit {
                debug!(added, "Recent-window enrichment hit merge cap");
                return;
            }
        }
    }

    if added > 0 {
        debug!(added, "Recent-window enrichment merged messages");
    }
}

/// Broadened `in:anywhere` fallback.
///
/// Triggers only when the primary retrieval produced zero results and a
/// date range was parsed. Metadata-only, capped at `broaden_limit`.
pub async fn broaden_when_empty(
    provider: &Arc<dyn MailProvider>,
    config: &PipelineConfig,
    range: &DateRange,
    messages: &mut Vec<CandidateMessage>,
) {
    if !messages.is_empty() {
        return;
    }

    let query = format!("in:anywhere {}", range.query_clause());
    let ids = match provider
        .list_message_ids(&query, None, config.broaden_limit)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!(query = %query, error = %e, "Broadening fallback aborted");
            return;
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            continue;
        }
        match provider.get_message(&id, FetchFormat::Metadata).await {
            Ok(message) => messages.push(candidate_from(&message)),
            Err(e) => {
                debug!(message_id = %id, error = %e, "Broadened fetch failed; skipping");
            }
        }
    }

    debug!(result_count = messages.len(), "Broadening fallback merged messages");
}
