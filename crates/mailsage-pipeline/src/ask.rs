//! The ask orchestrator.
//!
//! Wires the pipeline stages together for one request: memory capture,
//! temporal/keyword/target extraction, query planning, retrieval, the
//! fallback enrichers, the forced-summary subflow, compaction, synthesis,
//! and action inference. At most four generation calls are made per
//! request: planning, the optional forced summary, the main answer, and the
//! optional repair summary.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument};

use mailsage_core::{
    parse_date_range,
    text::{extract_keywords, extract_target_tokens},
    AskOutcome, GenerationBackend, MailProvider, MemoryStore, OcrBackend, Question, Result,
};

use crate::action::infer_action;
use crate::compact::{compact_messages, rank_by_recency};
use crate::config::PipelineConfig;
use crate::enrich::{broaden_when_empty, enrich_recent_window};
use crate::memory::capture_memory;
use crate::planner::plan_queries;
use crate::retrieval::run_retrieval;
use crate::summary::{forced_summary, has_summary_intent};
use crate::synthesize::synthesize_answer;

/// The natural-language mailbox query-and-action pipeline.
pub struct AskPipeline {
    provider: Arc<dyn MailProvider>,
    generation: Arc<dyn GenerationBackend>,
    memory: Arc<dyn MemoryStore>,
    ocr: Option<Arc<dyn OcrBackend>>,
    config: PipelineConfig,
}

impl AskPipeline {
    pub fn new(
        provider: Arc<dyn MailProvider>,
        generation: Arc<dyn GenerationBackend>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            provider,
            generation,
            memory,
            ocr: None,
            config: PipelineConfig::default(),
        }
    }

    /// Attach an OCR backend for image-only bodies.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Override the pipeline tuning knobs.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer one mailbox question.
    #[instrument(skip(self, question), fields(subsystem = "pipeline", op = "ask", user_id = %question.user_id))]
    pub async fn ask(&self, question: &Question) -> Result<AskOutcome> {
        let started = Instant::now();

        // Independent of the rest; keyed off the raw question.
        capture_memory(&*self.memory, question).await;

        let lower = question.text.to_lowercase();
        let range = parse_date_range(&lower, Utc::now());
        let keywords = extract_keywords(&lower);
        let target_tokens = extract_target_tokens(&lower);
        debug!(
            date_window = range.as_ref().map(|r| r.description.as_str()).unwrap_or("none"),
            keyword_count = keywords.len(),
            target_count = target_tokens.len(),
            "Parsed question"
        );

        let queries = plan_queries(
            &*self.generation,
            &self.config,
            &question.text,
            range.as_ref(),
            &keywords,
        )
        .await;

        let mut retrieval =
            run_retrieval(&self.provider, self.ocr.as_ref(), &self.config, &queries).await;

        if let Some(range) = range.as_ref() {
            broaden_when_empty(&self.provider, &self.config, range, &mut retrieval.messages)
                .await;
        }
        enrich_recent_window(
            &self.provider,
            &self.config,
            &target_tokens,
            &mut retrieval.messages,
        )
        .await;

        let forced = if has_summary_intent(&lower) {
            forced_summary(&self.provider, &*self.generation, &self.config, &question.text)
                .await
        } else {
            None
        };

        let compact = compact_messages(&retrieval.messages, &self.config);
        let notes = self
            .memory
            .find_notes(&question.user_id, self.config.memory_note_limit)
            .await
            .unwrap_or_default();

        let synthesis = synthesize_answer(
            &*self.generation,
            &self.config,
            &question.text,
            range.as_ref(),
            &target_tokens,
            &retrieval.participants,
            &notes,
            &compact,
            &retrieval.messages,
            forced.as_ref(),
        )
        .await?;

        let ranked = rank_by_recency(&retrieval.messages);
        let action = infer_action(
            &lower,
            synthesis.draft.as_ref(),
            ranked.first(),
            forced.as_ref(),
            &synthesis.answer,
            &self.config,
        );

        info!(
            result_count = ranked.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            action = action.kind().unwrap_or("none"),
            "Ask request complete"
        );

        Ok(AskOutcome {
            answer: synthesis.answer,
            citations: synthesis.citations,
            action,
            messages: ranked,
            queries,
            forced_summary: forced.map(|f| f.summary),
        })
    }
}
