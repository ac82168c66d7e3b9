//! Message body extraction from provider part trees.
//!
//! Providers return a nested MIME part tree; the body the user actually
//! wrote is the first `text/plain` and/or `text/html` part found in
//! breadth-first order (the direct body, when present, is the root part's
//! own data). Image parts are collected separately for the OCR fallback.

use std::collections::VecDeque;

use mailsage_core::MessagePart;

/// Plain and HTML bodies extracted from a part tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBody {
    pub text: Option<String>,
    pub html: Option<String>,
}

/// Breadth-first traversal picking the first `text/plain` and first
/// `text/html` parts that carry data.
pub fn extract_bodies(root: &MessagePart) -> ExtractedBody {
    let mut out = ExtractedBody::default();
    let mut queue: VecDeque<&MessagePart> = VecDeque::new();
    queue.push_back(root);

    while let Some(part) = queue.pop_front() {
        if out.text.is_some() && out.html.is_some() {
            break;
        }
        if let Some(data) = part.data.as_ref().filter(|d| !d.is_empty()) {
            if out.text.is_none() && part.mime_type.starts_with("text/plain") {
                out.text = Some(data.clone());
            } else if out.html.is_none() && part.mime_type.starts_with("text/html") {
                out.html = Some(data.clone());
            }
        }
        for child in &part.parts {
            queue.push_back(child);
        }
    }

    out
}

/// Collect up to `max` image parts, breadth-first. A part qualifies when it
/// has an `image/*` MIME type and either inline data or an attachment id.
pub fn collect_image_parts(root: &MessagePart, max: usize) -> Vec<&MessagePart> {
    let mut found = Vec::new();
    let mut queue: VecDeque<&MessagePart> = VecDeque::new();
    queue.push_back(root);

    while let Some(part) = queue.pop_front() {
        if found.len() == max {
            break;
        }
        if part.mime_type.starts_with("image/")
            && (part.data.is_some() || part.attachment_id.is_some())
        {
            found.push(part);
        }
        for child in &part.parts {
            queue.push_back(child);
        }
    }

    found
}

/// Convert an HTML body to whitespace-normalized plain text.
pub fn html_to_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
