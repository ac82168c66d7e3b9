//! # mailsage-inference
//!
//! Generation-service backends for mailsage: an OpenAI-compatible chat
//! backend, a vision-model OCR backend, the strict-JSON contract parser for
//! untrusted model output, and a scriptable mock backend for tests.

pub mod contract;
pub mod mock;
pub mod ocr;
pub mod openai;

pub use contract::{extract_contract, Extracted};
pub use mock::MockGenerationBackend;
pub use ocr::VisionOcrBackend;
pub use openai::{OpenAiBackend, OpenAiConfig};
