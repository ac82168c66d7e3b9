//! Query planning.
//!
//! Merges model-suggested queries, the parsed date constraint, and keyword
//! queries into a bounded, deduplicated list. The output always has between
//! 1 and `max_queries` entries; every planning failure degrades to the
//! catch-all query rather than aborting the request.

use tracing::{debug, warn};

use mailsage_core::text::normalize_whitespace;
use mailsage_core::{defaults, DateRange, GenerationBackend, PlannedQueries};
use mailsage_inference::{extract_contract, Extracted};

use crate::config::PipelineConfig;

const PLANNER_SYSTEM: &str = "You plan mailbox search queries for an email assistant.";

fn planner_prompt(limit: usize, question: &str) -> String {
    format!(
        "Propose up to {} provider search queries that would find the messages \
         this question is about. Respond with only a JSON object of the form \
         {{\"queries\": [\"...\"]}}.\n\nQuestion: {}",
        limit, question
    )
}

fn qualify(query: &str, clause: Option<&str>) -> String {
    match clause {
        Some(clause) => normalize_whitespace(&format!("{} {}", query, clause)),
        None => normalize_whitespace(query),
    }
}

/// Ask the generation service for provider queries; any failure yields an
/// empty list for the caller to replace with the catch-all.
async fn model_queries(
    generation: &dyn GenerationBackend,
    config: &PipelineConfig,
    question: &str,
) -> Vec<String> {
    let raw = match generation
        .complete(
            PLANNER_SYSTEM,
            &planner_prompt(config.model_query_limit, question),
            defaults::PLAN_TEMPERATURE,
            defaults::PLAN_MAX_TOKENS,
        )
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Query planning call failed; using catch-all");
            return Vec::new();
        }
    };

    match extract_contract::<PlannedQueries>(&raw) {
        Extracted::Valid(planned) => planned
            .queries
            .into_iter()
            .map(|q| normalize_whitespace(&q))
            .filter(|q| !q.is_empty())
            .take(config.model_query_limit)
            .collect(),
        Extracted::Malformed { reason } => {
            warn!(reason = %reason, "Query planning output malformed; using catch-all");
            Vec::new()
        }
    }
}

/// Plan the provider queries for a question.
pub async fn plan_queries(
    generation: &dyn GenerationBackend,
    config: &PipelineConfig,
    question: &str,
    range: Option<&DateRange>,
    keywords: &[String],
) -> Vec<String> {
    let mut planned = model_queries(generation, config, question).await;
    if planned.is_empty() {
        planned.push(defaults::CATCH_ALL_QUERY.to_string());
    }

    let clause = range.map(|r| r.query_clause());
    let clause = clause.as_deref();

    let mut queries: Vec<String> = Vec::new();

    // Keyword composite first: one OR-query over from/to/subject/bare per
    // token. Prepended so it survives truncation.
    if !keywords.is_empty() {
        let composite = keywords
            .iter()
            .map(|t| format!("from:{t} OR to:{t} OR subject:{t} OR {t}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        queries.push(qualify(&composite, clause));
    }

    for query in &planned {
        queries.push(qualify(query, clause));
    }

    if let Some(clause) = clause {
        queries.push(qualify(defaults::CATCH_ALL_QUERY, Some(clause)));
    }

    if !keywords.is_empty() {
        let subject_only = keywords
            .iter()
            .map(|t| format!("subject:{t}"))
            .collect::<Vec<_>>()
            .join(" OR ");
        queries.push(qualify(&subject_only, clause));
    }

    let mut deduped: Vec<String> = Vec::new();
    for query in queries {
        if !query.is_empty() && !deduped.contains(&query) {
            deduped.push(query);
        }
    }
    deduped.truncate(config.max_queries);

    if deduped.is_empty() {
        deduped.push(defaults::CATCH_ALL_QUERY.to_string());
    }

    debug!(result_count = deduped.len(), "Planned provider queries");
    deduped
}
