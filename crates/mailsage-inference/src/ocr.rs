//! Vision-model OCR backend for image-only message bodies.
//!
//! OCR is modeled as a vision-model call rather than a local OCR library:
//! the image is base64-encoded and sent to an Ollama-style `/api/generate`
//! endpoint with a transcription prompt. The retrieval engine treats every
//! OCR failure as non-fatal.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mailsage_core::{defaults, Error, OcrBackend, Result};

const OCR_PROMPT: &str =
    "Transcribe all text visible in this image. Return only the text, no commentary.";

/// Vision-model OCR backend.
pub struct VisionOcrBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl VisionOcrBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            timeout_secs: defaults::OCR_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns `None` if `MAILSAGE_OCR_MODEL` is not set; the retrieval
    /// engine then simply skips the OCR fallback.
    pub fn from_env() -> Option<Self> {
        let model = std::env::var("MAILSAGE_OCR_MODEL").ok()?;
        if model.is_empty() {
            return None;
        }
        let base_url = std::env::var("MAILSAGE_OCR_BASE_URL")
            .unwrap_or_else(|_| defaults::OCR_BASE_URL.to_string());
        Some(Self::new(base_url, model))
    }
}

#[derive(Serialize)]
struct VisionGenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct VisionGenerateResponse {
    response: String,
}

#[async_trait]
impl OcrBackend for VisionOcrBackend {
    async fn recognize_text(&self, image_data: &[u8], mime_type: &str) -> Result<String> {
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);
        debug!(
            mime_type = mime_type,
            image_bytes = image_data.len(),
            model = %self.model,
            "Running OCR over image part"
        );

        let request = VisionGenerateRequest {
            model: self.model.clone(),
            prompt: OCR_PROMPT.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Inference(format!("OCR request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "OCR service returned {}: {}",
                status, body
            )));
        }

        let result: VisionGenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("failed to parse OCR response: {}", e)))?;

        Ok(result.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
