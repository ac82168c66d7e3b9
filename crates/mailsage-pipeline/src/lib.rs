//! # mailsage-pipeline
//!
//! The natural-language mailbox query-and-action pipeline: a free-text
//! question becomes a bounded set of provider search queries, a ranked and
//! deduplicated candidate set, a synthesized answer, and an optional
//! proposed send/schedule action with an inferred recipient.
//!
//! Stage modules, leaves first:
//! - [`planner`]: bounded, deduplicated query planning
//! - [`retrieval`]: query by folder fan-out under fetch/aggregate caps
//! - [`participants`]: fuzzy From/To scoring against target-name tokens
//! - [`enrich`]: recent-window and date-broadening fallbacks
//! - [`compact`]: recency ranking and prompt-budget compaction
//! - [`summary`]: the forced-summary subflow
//! - [`synthesize`]: primary answer call with repair and fallback
//! - [`action`]: send-intent state machine and recipient resolution
//! - [`memory`]: "remember X: Y" capture
//! - [`ask`]: the orchestrator wiring the stages together

pub mod action;
pub mod ask;
pub mod compact;
pub mod config;
pub mod enrich;
pub mod memory;
pub mod participants;
pub mod planner;
pub mod retrieval;
pub mod summary;
pub mod synthesize;

pub use ask::AskPipeline;
pub use config::PipelineConfig;
pub use summary::ForcedSummary;
