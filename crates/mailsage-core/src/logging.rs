//! Structured logging schema and field name constants for mailsage.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (message parts, tokens) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for one ask request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "pipeline", "mail", "inference"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "planner", "retrieval", "enrich", "synthesize", "openai"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ask", "plan_queries", "run_retrieval", "complete"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Requesting user identity.
pub const USER_ID: &str = "user_id";

/// Provider message id being operated on.
pub const MESSAGE_ID: &str = "message_id";

/// Provider search query text.
pub const QUERY: &str = "query";

/// Mailbox folder being searched.
pub const FOLDER: &str = "folder";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a stage.
pub const RESULT_COUNT: &str = "result_count";

/// Number of full-format fetches spent so far.
pub const FULL_FETCHES: &str = "full_fetches";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";
