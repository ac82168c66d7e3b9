//! Centralized default constants for the mailsage system.
//!
//! **This module is the single source of truth** for all shared default
//! values, including the hand-tuned retrieval/enrichment thresholds. The
//! thresholds were carried over from the production system as-is; treat them
//! as tuning knobs (they are all overridable through `PipelineConfig` in
//! mailsage-pipeline), not derived quantities.

// =============================================================================
// QUERY PLANNING
// =============================================================================

/// Maximum provider queries executed per request.
pub const MAX_QUERIES: usize = 6;

/// Maximum queries requested from the generation service.
pub const MODEL_QUERY_LIMIT: usize = 3;

/// Catch-all query used when planning yields nothing usable.
pub const CATCH_ALL_QUERY: &str = "in:inbox";

/// Maximum salient keyword tokens extracted from a question.
pub const KEYWORD_LIMIT: usize = 5;

/// Maximum target-name tokens extracted from a to/from clause.
pub const TARGET_TOKEN_LIMIT: usize = 4;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Maximum message ids listed per query+folder unit.
pub const LIST_PAGE_LIMIT: usize = 50;

/// Maximum full-format fetches per request; further fetches are metadata-only.
pub const FULL_FETCH_LIMIT: usize = 5;

/// Maximum aggregated candidate messages per request.
pub const AGGREGATE_LIMIT: usize = 60;

/// Bounded concurrency for the query+folder retrieval pool.
pub const RETRIEVAL_CONCURRENCY: usize = 4;

/// Full-format bodies shorter than this trigger the OCR fallback.
pub const MIN_BODY_CHARS_BEFORE_OCR: usize = 20;

/// Maximum image parts handed to OCR per message.
pub const OCR_MAX_IMAGE_PARTS: usize = 2;

/// Maximum accumulated OCR characters appended to a body.
pub const OCR_MAX_CHARS: usize = 4000;

// =============================================================================
// ENRICHMENT & FALLBACKS
// =============================================================================

/// Recent-window enrichment triggers below this result count.
pub const ENRICH_MIN_RESULTS: usize = 8;

/// Participant score gate for merging an enrichment candidate.
pub const ENRICH_SCORE_THRESHOLD: i32 = 3;

/// Messages scanned per folder during recent-window enrichment.
pub const ENRICH_SCAN_LIMIT: usize = 100;

/// Maximum messages newly added by recent-window enrichment.
pub const ENRICH_MERGE_LIMIT: usize = 40;

/// Result cap for the broadened `in:anywhere` fallback search.
pub const BROADEN_LIMIT: usize = 30;

// =============================================================================
// CONTEXT COMPACTION
// =============================================================================

/// Initial compacted message count.
pub const COMPACT_LIMIT: usize = 12;

/// First shrink step when the serialized context exceeds the budget.
pub const COMPACT_SHRINK_FIRST: usize = 8;

/// Second shrink step when the serialized context still exceeds the budget.
pub const COMPACT_SHRINK_SECOND: usize = 5;

/// Serialized compact-context budget in characters.
pub const COMPACT_BUDGET_CHARS: usize = 8000;

/// Maximum preview characters per compacted message.
pub const PREVIEW_CHARS: usize = 600;

// =============================================================================
// FORCED SUMMARY
// =============================================================================

/// Full messages fetched by the forced-summary subflow.
pub const SUMMARY_FETCH_LIMIT: usize = 10;

/// Maximum salient tokens in the forced-summary query.
pub const SUMMARY_TOKEN_LIMIT: usize = 4;

/// Body characters handed to the forced-summary generation call.
pub const SUMMARY_BODY_CHARS: usize = 9000;

// =============================================================================
// SYNTHESIS & ACTION INFERENCE
// =============================================================================

/// Sentinel answer string the model returns when it cannot answer.
pub const NO_ANSWER_SENTINEL: &str = "No answer";

/// Synthesized answers longer than this are not reused as a send body.
pub const ANSWER_BODY_LIMIT: usize = 800;

/// Default subject when no other signal resolves one.
pub const DEFAULT_SEND_SUBJECT: &str = "Quick note";

/// Default body when no other signal resolves one.
pub const DEFAULT_SEND_BODY: &str = "Thank you!";

// =============================================================================
// MEMORY
// =============================================================================

/// Memory notes included in the synthesis prompt (most recent first).
pub const MEMORY_NOTE_LIMIT: usize = 12;

/// Maximum characters kept from a captured memory key.
pub const MEMORY_KEY_CHARS: usize = 120;

/// Maximum characters kept from a captured memory value.
pub const MEMORY_VALUE_CHARS: usize = 2000;

// =============================================================================
// TEMPORAL
// =============================================================================

/// Clamp for the `last N days` phrase.
pub const DATE_RANGE_MAX_DAYS: i64 = 30;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible base URL.
pub const LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default generation model name.
pub const LLM_MODEL: &str = "gpt-4o-mini";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 60;

/// Timeout for OCR/vision requests in seconds.
pub const OCR_TIMEOUT_SECS: u64 = 120;

/// Default vision base URL for the OCR backend.
pub const OCR_BASE_URL: &str = "http://127.0.0.1:11434";

/// Temperature for the query-planning call.
pub const PLAN_TEMPERATURE: f32 = 0.0;

/// Temperature for answer synthesis and summaries.
pub const ANSWER_TEMPERATURE: f32 = 0.2;

/// Max tokens for the query-planning call.
pub const PLAN_MAX_TOKENS: u32 = 256;

/// Max tokens for the answer synthesis call.
pub const ANSWER_MAX_TOKENS: u32 = 1024;

/// Max tokens for summary calls (forced summary and repair).
pub const SUMMARY_MAX_TOKENS: u32 = 512;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8080;
