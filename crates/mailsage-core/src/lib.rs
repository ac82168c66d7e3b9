//! # mailsage-core
//!
//! Core types, traits, and abstractions for the mailsage ask pipeline.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other mailsage crates depend on: the mailbox/generation/memory
//! trait seams, the request-scoped domain model, temporal phrase parsing,
//! and text tokenization rules.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod temporal;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use temporal::{parse_date_range, parse_message_date, DateRange};
pub use traits::*;
