//! Pipeline tuning knobs.
//!
//! Every cap and threshold the pipeline applies, seeded from
//! `mailsage_core::defaults` and overridable per instance. The enrichment
//! thresholds in particular are hand-tuned production values; override them
//! rather than editing the defaults.

use mailsage_core::defaults;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // Query planning
    pub max_queries: usize,
    pub model_query_limit: usize,

    // Retrieval
    pub list_page_limit: usize,
    pub full_fetch_limit: usize,
    pub aggregate_limit: usize,
    pub retrieval_concurrency: usize,
    pub min_body_chars_before_ocr: usize,
    pub ocr_max_image_parts: usize,
    pub ocr_max_chars: usize,

    // Enrichment & fallbacks
    pub enrich_min_results: usize,
    pub enrich_score_threshold: i32,
    pub enrich_scan_limit: usize,
    pub enrich_merge_limit: usize,
    pub broaden_limit: usize,

    // Compaction
    pub compact_limit: usize,
    pub compact_shrink_first: usize,
    pub compact_shrink_second: usize,
    pub compact_budget_chars: usize,
    pub preview_chars: usize,

    // Forced summary
    pub summary_fetch_limit: usize,
    pub summary_token_limit: usize,
    pub summary_body_chars: usize,

    // Synthesis & action inference
    pub answer_body_limit: usize,
    pub memory_note_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_queries: defaults::MAX_QUERIES,
            model_query_limit: defaults::MODEL_QUERY_LIMIT,
            list_page_limit: defaults::LIST_PAGE_LIMIT,
            full_fetch_limit: defaults::FULL_FETCH_LIMIT,
            aggregate_limit: defaults::AGGREGATE_LIMIT,
            retrieval_concurrency: defaults::RETRIEVAL_CONCURRENCY,
            min_body_chars_before_ocr: defaults::MIN_BODY_CHARS_BEFORE_OCR,
            ocr_max_image_parts: defaults::OCR_MAX_IMAGE_PARTS,
            ocr_max_chars: defaults::OCR_MAX_CHARS,
            enrich_min_results: defaults::ENRICH_MIN_RESULTS,
            enrich_score_threshold: defaults::ENRICH_SCORE_THRESHOLD,
            enrich_scan_limit: defaults::ENRICH_SCAN_LIMIT,
            enrich_merge_limit: defaults::ENRICH_MERGE_LIMIT,
            broaden_limit: defaults::BROADEN_LIMIT,
            compact_limit: defaults::COMPACT_LIMIT,
            compact_shrink_first: defaults::COMPACT_SHRINK_FIRST,
            compact_shrink_second: defaults::COMPACT_SHRINK_SECOND,
            compact_budget_chars: defaults::COMPACT_BUDGET_CHARS,
            preview_chars: defaults::PREVIEW_CHARS,
            summary_fetch_limit: defaults::SUMMARY_FETCH_LIMIT,
            summary_token_limit: defaults::SUMMARY_TOKEN_LIMIT,
            summary_body_chars: defaults::SUMMARY_BODY_CHARS,
            answer_body_limit: defaults::ANSWER_BODY_LIMIT,
            memory_note_limit: defaults::MEMORY_NOTE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_named_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_queries, 6);
        assert_eq!(config.full_fetch_limit, 5);
        assert_eq!(config.aggregate_limit, 60);
        assert_eq!(config.enrich_min_results, 8);
        assert_eq!(config.enrich_score_threshold, 3);
        assert_eq!(config.broaden_limit, 30);
    }

    #[test]
    fn test_overridable() {
        let config = PipelineConfig {
            retrieval_concurrency: 1,
            ..Default::default()
        };
        assert_eq!(config.retrieval_concurrency, 1);
        assert_eq!(config.max_queries, 6);
    }
}
