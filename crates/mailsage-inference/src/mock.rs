//! Mock generation backend for deterministic testing.
//!
//! Responses can be scripted three ways, checked in order: an explicit
//! queue (consumed first-in-first-out), substring→response mappings matched
//! against the user prompt, and a default response. Every call is logged
//! for assertion.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use mailsage_core::{Error, GenerationBackend, Result};

/// One recorded generation call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Default)]
struct MockState {
    queue: VecDeque<Result<String>>,
    mappings: Vec<(String, String)>,
    default_response: Option<String>,
    fail_always: bool,
    calls: Vec<MockCall>,
}

/// Scriptable mock [`GenerationBackend`].
#[derive(Clone, Default)]
pub struct MockGenerationBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response, consumed before any mapping or default.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.state
            .lock()
            .expect("mock state")
            .queue
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failure.
    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.state
            .lock()
            .expect("mock state")
            .queue
            .push_back(Err(Error::Inference(reason.into())));
        self
    }

    /// Respond with `response` whenever the user prompt contains `needle`.
    pub fn with_mapping(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.state
            .lock()
            .expect("mock state")
            .mappings
            .push((needle.into(), response.into()));
        self
    }

    /// Fallback response when nothing else matches.
    pub fn with_default(self, response: impl Into<String>) -> Self {
        self.state.lock().expect("mock state").default_response = Some(response.into());
        self
    }

    /// Fail every call, simulating an unavailable service.
    pub fn fail_always(self) -> Self {
        self.state.lock().expect("mock state").fail_always = true;
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().expect("mock state").calls.clone()
    }

    /// Number of generation calls made.
    pub fn call_count(&self) -> usize {
        self.state.lock().expect("mock state").calls.len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let mut state = self.state.lock().expect("mock state");
        state.calls.push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
            temperature,
            max_tokens,
        });

        if state.fail_always {
            return Err(Error::Inference("mock backend configured to fail".to_string()));
        }

        if let Some(queued) = state.queue.pop_front() {
            return queued;
        }

        if let Some((_, response)) = state
            .mappings
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return Ok(response.clone());
        }

        if let Some(default) = &state.default_response {
            return Ok(default.clone());
        }

        Err(Error::Inference("mock backend has no scripted response".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
