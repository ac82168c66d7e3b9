//! Strict-JSON contract parsing for untrusted model output.
//!
//! The generation service is prompted to return only a JSON object of a
//! given shape, but its output is untrusted: models wrap objects in code
//! fences, prepend prose, or return something else entirely. This module
//! validates output against the expected shape and reports failure as data
//! rather than branching on raw object shape at call sites.

use serde::de::DeserializeOwned;

/// Outcome of validating model output against a contract.
///
/// A sum type instead of `Result` on purpose: a malformed payload is an
/// expected, recoverable state every caller must handle, not an error to
/// bubble with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<T> {
    Valid(T),
    Malformed { reason: String },
}

impl<T> Extracted<T> {
    pub fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Malformed { .. } => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Parse model output against the contract type `T`.
///
/// Repair steps, in order: direct parse; strip markdown code fences and
/// retry; extract the first balanced `{...}` object and retry.
pub fn extract_contract<T: DeserializeOwned>(raw: &str) -> Extracted<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Extracted::Malformed {
            reason: "empty response".to_string(),
        };
    }

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Extracted::Valid(value);
    }

    let unfenced = strip_code_fences(trimmed);
    if let Ok(value) = serde_json::from_str::<T>(unfenced.trim()) {
        return Extracted::Valid(value);
    }

    if let Some(object) = first_balanced_object(trimmed) {
        match serde_json::from_str::<T>(object) {
            Ok(value) => return Extracted::Valid(value),
            Err(e) => {
                return Extracted::Malformed {
                    reason: format!("embedded object did not match contract: {}", e),
                }
            }
        }
    }

    Extracted::Malformed {
        reason: "no JSON object found in response".to_string(),
    }
}

/// Strip a single leading/trailing markdown code fence, with or without a
/// language tag.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line, if any.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest)
}

/// Find the first balanced top-level `{...}` object, respecting strings and
/// escapes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
